//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login (argon2)
//! - `stats` - Per-user walk totals
//! - `friendship` - Friend sets, pending requests, request workflow
//! - `ranking` - Ordered leaderboards, city-wide or friends-scoped
//! - `city` - City and store rollups behind the authorization gate
//! - `stores` - Store management and traffic recording
//! - `walks` - Walk submission and listing
//!
//! Every service borrows a `&dyn RecordStore` for the duration of one
//! operation. Aggregation is done by pure functions that the services feed
//! with rows loaded up front, so a request sees either a complete result or
//! an error.

pub mod auth;
pub mod city;
pub mod error;
pub mod friendship;
pub mod ranking;
pub mod stats;
pub mod stores;
pub mod walks;

pub use auth::{AuthError, AuthService};
pub use city::CityService;
pub use error::ServiceError;
pub use friendship::FriendshipService;
pub use ranking::{RankingScope, RankingService};
pub use stats::StatsService;
pub use stores::StoreService;
pub use walks::WalkService;

use energy_plus_core::{Role, UserId};

use crate::models::CurrentUser;

/// The identity an operation runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

impl From<&CurrentUser> for Caller {
    fn from(user: &CurrentUser) -> Self {
        Self::new(user.id, user.role)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    //! Fixtures shared by service tests.

    use chrono::Utc;

    use energy_plus_core::{Role, UserId, Username, WalkId, energy_for_distance};

    use crate::db::{MemoryRecordStore, RecordStore};
    use crate::models::{NewUser, NewWalk, User, Walk};

    pub async fn user(store: &MemoryRecordStore, username: &str, role: Role) -> User {
        store
            .create_user(NewUser {
                username: Username::parse(username).unwrap(),
                display_name: username.to_owned(),
                role,
                password_hash: "not-a-real-hash".to_owned(),
            })
            .await
            .unwrap()
    }

    pub async fn walk(store: &MemoryRecordStore, user_id: UserId, distance: f64) -> Walk {
        store
            .create_walk(NewWalk {
                user_id,
                distance,
                energy: energy_for_distance(distance),
                duration: 1800,
            })
            .await
            .unwrap()
    }

    /// A detached walk row for pure-function tests.
    pub fn walk_row(id: i32, user_id: i32, distance: f64, energy: f64) -> Walk {
        Walk {
            id: WalkId::new(id),
            user_id: UserId::new(user_id),
            distance,
            energy,
            duration: 600,
            created_at: Utc::now(),
        }
    }

    /// A detached user row for pure-function tests.
    pub fn user_row(id: i32, username: &str) -> User {
        User {
            id: UserId::new(id),
            username: Username::parse(username).unwrap(),
            display_name: username.to_owned(),
            role: Role::Citizen,
            created_at: Utc::now(),
        }
    }
}
