//! User management commands.
//!
//! ```bash
//! EP_USER_PASSWORD=... ep-cli user create -u city.hall -n "City Hall" -r city_admin
//! ```
//!
//! This is the only way to create `city_admin` accounts; the HTTP API
//! refuses that role at registration.
//!
//! # Environment Variables
//!
//! - `EP_USER_PASSWORD` - Password for the new account

use energy_plus_core::Role;
use energy_plus_server::db::PgRecordStore;
use energy_plus_server::services::AuthService;

use super::{CommandError, connect};

/// Create a user with any role.
///
/// # Returns
///
/// The id of the created user.
pub async fn create(username: &str, name: &str, role: &str) -> Result<i32, CommandError> {
    // Parse and validate role
    let role: Role = role
        .parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))?;

    let password = std::env::var("EP_USER_PASSWORD")
        .map_err(|_| CommandError::MissingEnvVar("EP_USER_PASSWORD"))?;

    let pool = connect().await?;
    let store = PgRecordStore::new(pool);

    tracing::info!("Creating user: {} ({})", username, role);
    let user = AuthService::new(&store)
        .create_user(username, name, &password, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );

    Ok(user.id.as_i32())
}
