//! Seed the database with demo citizens and one walk each.
//!
//! Every demo account uses the password `123456`. Usernames that already
//! exist are skipped, so the command can be run repeatedly.

use energy_plus_core::{Role, Username};
use energy_plus_server::db::{PgRecordStore, RecordStore};
use energy_plus_server::services::walks::WalkInput;
use energy_plus_server::services::{AuthService, WalkService};

use super::{CommandError, connect};

const DEMO_PASSWORD: &str = "123456";

struct DemoUser {
    username: &'static str,
    display_name: &'static str,
    /// Kilometers.
    distance: f64,
    /// Minutes.
    minutes: i32,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "maria.silva",
        display_name: "Maria Silva",
        distance: 45.3,
        minutes: 180,
    },
    DemoUser {
        username: "joao.santos",
        display_name: "João Santos",
        distance: 38.7,
        minutes: 150,
    },
    DemoUser {
        username: "ana.costa",
        display_name: "Ana Costa",
        distance: 32.1,
        minutes: 120,
    },
    DemoUser {
        username: "pedro.lima",
        display_name: "Pedro Lima",
        distance: 28.5,
        minutes: 110,
    },
    DemoUser {
        username: "carla.mendes",
        display_name: "Carla Mendes",
        distance: 24.9,
        minutes: 100,
    },
];

/// Insert the demo users and their walks.
pub async fn demo_data() -> Result<(), CommandError> {
    let pool = connect().await?;
    let store = PgRecordStore::new(pool);
    seed(&store).await
}

async fn seed(store: &dyn RecordStore) -> Result<(), CommandError> {
    let auth = AuthService::new(store);
    let walks = WalkService::new(store);

    let mut created = 0_usize;
    for demo in DEMO_USERS {
        let username = Username::parse(demo.username)?;
        if store.get_user_by_username(&username).await?.is_some() {
            tracing::info!(username = demo.username, "User exists, skipping");
            continue;
        }

        let user = auth
            .create_user(
                demo.username,
                demo.display_name,
                DEMO_PASSWORD,
                Role::Citizen,
            )
            .await?;
        walks
            .record_walk(
                user.id,
                WalkInput {
                    distance: demo.distance,
                    duration: demo.minutes * 60,
                },
            )
            .await?;

        created += 1;
    }

    tracing::info!(created, total = DEMO_USERS.len(), "Seeding complete");
    Ok(())
}
