//! Energy+ CLI - database migrations, demo data and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ep-cli migrate
//!
//! # Insert the demo citizens and their walks
//! ep-cli seed
//!
//! # Create a city admin (password from EP_USER_PASSWORD)
//! EP_USER_PASSWORD=... ep-cli user create -u city.hall -n "City Hall" -r city_admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed database with demo users and walks
//! - `user create` - Create users with any role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ep-cli")]
#[command(author, version, about = "Energy+ CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed database with demo users and walks
    Seed,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name (lowercase letters, digits, `.`, `_`, `-`)
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`citizen`, `store_owner`, `city_admin`)
        #[arg(short, long, default_value = "citizen")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::demo_data().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                name,
                role,
            } => {
                commands::user::create(&username, &name, &role).await?;
            }
        },
    }
    Ok(())
}
