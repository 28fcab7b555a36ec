//! Record store: persistence for users, walks, friendships, stores and
//! store traffic.
//!
//! # Backends
//!
//! - [`PgRecordStore`] - `PostgreSQL` via sqlx (production)
//! - [`MemoryRecordStore`] - in-process tables behind one lock (tests, demos)
//!
//! Services only ever see `&dyn RecordStore`, so the engine is storage
//! agnostic and receives its store explicitly.
//!
//! ## Tables
//!
//! - `app_user` - Identity and role
//! - `user_password` - Argon2 password hashes (never joined into `User`)
//! - `walk` - Completed walk sessions
//! - `friendship` - Friend requests and accepted friendships
//! - `store` - Participating stores
//! - `store_traffic` - Daily traffic snapshots per store
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p energy-plus-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use energy_plus_core::{FriendshipId, FriendshipStatus, StoreId, UserId, Username};

use crate::models::{
    Friendship, NewStore, NewStoreTraffic, NewUser, NewWalk, Store, StoreTraffic, User, Walk,
};

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage capabilities the engine needs.
///
/// Listing methods return rows in ascending id order unless stated
/// otherwise. Methods that check an invariant before writing perform the
/// check and the write atomically.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user together with its password hash.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError>;

    /// Get a user and their password hash for credential verification.
    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Get the users with the given ids. Unknown ids are skipped.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;

    // =========================================================================
    // Walks
    // =========================================================================

    /// Insert a walk. Returns `RepositoryError::NotFound` if the user is gone.
    async fn create_walk(&self, new_walk: NewWalk) -> Result<Walk, RepositoryError>;

    async fn list_walks(&self) -> Result<Vec<Walk>, RepositoryError>;

    /// All walks owned by any of `user_ids`, in one read.
    async fn list_walks_for_users(&self, user_ids: &[UserId])
    -> Result<Vec<Walk>, RepositoryError>;

    // =========================================================================
    // Friendships
    // =========================================================================

    /// Insert a pending friendship.
    ///
    /// Returns `RepositoryError::Conflict` if a pending or accepted
    /// friendship already exists for the unordered pair.
    async fn create_friendship(
        &self,
        requester_id: UserId,
        recipient_id: UserId,
    ) -> Result<Friendship, RepositoryError>;

    async fn get_friendship(&self, id: FriendshipId)
    -> Result<Option<Friendship>, RepositoryError>;

    /// Friendships where the user is either party, ordered by creation.
    async fn list_friendships_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Friendship>, RepositoryError>;

    /// Move a friendship from `from` to `to`.
    ///
    /// Returns `RepositoryError::NotFound` if the friendship doesn't exist and
    /// `RepositoryError::Conflict` if its current status is not `from`.
    async fn transition_friendship(
        &self,
        id: FriendshipId,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Friendship, RepositoryError>;

    /// Delete the accepted friendship between `a` and `b` (either direction).
    ///
    /// Returns `RepositoryError::NotFound` if none exists.
    async fn delete_accepted_friendship(&self, a: UserId, b: UserId)
    -> Result<(), RepositoryError>;

    // =========================================================================
    // Stores
    // =========================================================================

    /// Insert a store.
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a store.
    async fn create_store(&self, new_store: NewStore) -> Result<Store, RepositoryError>;

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    async fn get_store_by_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError>;

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError>;

    // =========================================================================
    // Store traffic
    // =========================================================================

    /// Insert a traffic snapshot. Returns `RepositoryError::NotFound` if the
    /// store doesn't exist.
    async fn create_store_traffic(
        &self,
        new_traffic: NewStoreTraffic,
    ) -> Result<StoreTraffic, RepositoryError>;

    /// Snapshots for a store in insertion order.
    async fn list_store_traffic(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreTraffic>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
