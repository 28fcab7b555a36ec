//! User domain types.
//!
//! The password credential is deliberately absent from [`User`]. It lives in
//! its own table and is only read by the login path, so no response built
//! from a `User` can leak it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use energy_plus_core::{Role, UserId, Username};

/// A registered user (domain type).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Name shown in rankings and friend lists.
    pub display_name: String,
    /// Role used for authorization.
    pub role: Role,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub display_name: String,
    pub role: Role,
    /// Argon2 PHC string.
    pub password_hash: String,
}
