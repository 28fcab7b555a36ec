//! `PostgreSQL` record store.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`). Invariants that
//! must hold under concurrent writers are enforced by the schema:
//!
//! - `app_user.username` is unique
//! - `store.owner_user_id` is unique
//! - `friendship_active_pair_idx` allows one pending/accepted row per
//!   unordered pair
//!
//! Unique violations surface as `RepositoryError::Conflict` and foreign key
//! violations as `RepositoryError::NotFound`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use energy_plus_core::{
    FriendshipId, FriendshipStatus, Role, StoreId, StoreTrafficId, UserId, Username, WalkId,
};

use super::{RecordStore, RepositoryError};
use crate::models::{
    Friendship, NewStore, NewStoreTraffic, NewUser, NewWalk, Store, StoreTraffic, User, Walk,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    display_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<Role>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            display_name: row.display_name,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct WalkRow {
    id: i32,
    user_id: i32,
    distance: f64,
    energy: f64,
    duration: i32,
    created_at: DateTime<Utc>,
}

impl From<WalkRow> for Walk {
    fn from(row: WalkRow) -> Self {
        Self {
            id: WalkId::new(row.id),
            user_id: UserId::new(row.user_id),
            distance: row.distance,
            energy: row.energy,
            duration: row.duration,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FriendshipRow {
    id: i32,
    requester_id: i32,
    recipient_id: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = RepositoryError;

    fn try_from(row: FriendshipRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<FriendshipStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: FriendshipId::new(row.id),
            requester_id: UserId::new(row.requester_id),
            recipient_id: UserId::new(row.recipient_id),
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    owner_user_id: i32,
    name: String,
    location: String,
    kinetic_floors: i32,
    led_totems: i32,
    energy_today: f64,
    daily_foot_traffic: i32,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            owner_user_id: UserId::new(row.owner_user_id),
            name: row.name,
            location: row.location,
            kinetic_floors: row.kinetic_floors,
            led_totems: row.led_totems,
            energy_today: row.energy_today,
            daily_foot_traffic: row.daily_foot_traffic,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreTrafficRow {
    id: i32,
    store_id: i32,
    pedestrians: i32,
    energy_generated: f64,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl From<StoreTrafficRow> for StoreTraffic {
    fn from(row: StoreTrafficRow) -> Self {
        Self {
            id: StoreTrafficId::new(row.id),
            store_id: StoreId::new(row.store_id),
            pedestrians: row.pedestrians,
            energy_generated: row.energy_generated,
            date: row.date,
            created_at: row.created_at,
        }
    }
}

/// Map a write error, turning constraint violations into domain errors.
fn map_write_error(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

fn ids_to_i32(ids: &[UserId]) -> Vec<i32> {
    ids.iter().map(UserId::as_i32).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Record store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Create a new record store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO app_user (username, display_name, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, display_name, role, created_at
            ",
        )
        .bind(new_user.username.as_str())
        .bind(&new_user.display_name)
        .bind(new_user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "username already exists"))?;

        sqlx::query(
            r"
            INSERT INTO user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(row.id)
        .bind(&new_user.password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, display_name, role, created_at
            FROM app_user
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, display_name, role, created_at
            FROM app_user
            WHERE username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserPasswordRow>(
            r"
            SELECT u.id, u.username, u.display_name, u.role, u.created_at,
                   p.password_hash
            FROM app_user u
            JOIN user_password p ON p.user_id = u.id
            WHERE u.username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, display_name, role, created_at
            FROM app_user
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, display_name, role, created_at
            FROM app_user
            WHERE id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(ids_to_i32(ids))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_walk(&self, new_walk: NewWalk) -> Result<Walk, RepositoryError> {
        let row = sqlx::query_as::<_, WalkRow>(
            r"
            INSERT INTO walk (user_id, distance, energy, duration)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, distance, energy, duration, created_at
            ",
        )
        .bind(new_walk.user_id.as_i32())
        .bind(new_walk.distance)
        .bind(new_walk.energy)
        .bind(new_walk.duration)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "walk already exists"))?;

        Ok(row.into())
    }

    async fn list_walks(&self) -> Result<Vec<Walk>, RepositoryError> {
        let rows = sqlx::query_as::<_, WalkRow>(
            r"
            SELECT id, user_id, distance, energy, duration, created_at
            FROM walk
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_walks_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<Walk>, RepositoryError> {
        let rows = sqlx::query_as::<_, WalkRow>(
            r"
            SELECT id, user_id, distance, energy, duration, created_at
            FROM walk
            WHERE user_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(ids_to_i32(user_ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_friendship(
        &self,
        requester_id: UserId,
        recipient_id: UserId,
    ) -> Result<Friendship, RepositoryError> {
        let row = sqlx::query_as::<_, FriendshipRow>(
            r"
            INSERT INTO friendship (requester_id, recipient_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, requester_id, recipient_id, status, created_at
            ",
        )
        .bind(requester_id.as_i32())
        .bind(recipient_id.as_i32())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "an active friendship already exists"))?;

        row.try_into()
    }

    async fn get_friendship(
        &self,
        id: FriendshipId,
    ) -> Result<Option<Friendship>, RepositoryError> {
        let row = sqlx::query_as::<_, FriendshipRow>(
            r"
            SELECT id, requester_id, recipient_id, status, created_at
            FROM friendship
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_friendships_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Friendship>, RepositoryError> {
        let rows = sqlx::query_as::<_, FriendshipRow>(
            r"
            SELECT id, requester_id, recipient_id, status, created_at
            FROM friendship
            WHERE requester_id = $1 OR recipient_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn transition_friendship(
        &self,
        id: FriendshipId,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Friendship, RepositoryError> {
        // Conditional update so a concurrent transition or delete can't interleave.
        let row = sqlx::query_as::<_, FriendshipRow>(
            r"
            UPDATE friendship
            SET status = $1
            WHERE id = $2 AND status = $3
            RETURNING id, requester_id, recipient_id, status, created_at
            ",
        )
        .bind(to.as_str())
        .bind(id.as_i32())
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return row.try_into();
        }

        match self.get_friendship(id).await? {
            Some(current) => Err(RepositoryError::Conflict(format!(
                "friendship is {}",
                current.status
            ))),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete_accepted_friendship(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM friendship
            WHERE status = 'accepted'
              AND ((requester_id = $1 AND recipient_id = $2)
                OR (requester_id = $2 AND recipient_id = $1))
            ",
        )
        .bind(a.as_i32())
        .bind(b.as_i32())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn create_store(&self, new_store: NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO store (owner_user_id, name, location, kinetic_floors,
                               led_totems, energy_today, daily_foot_traffic)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_user_id, name, location, kinetic_floors,
                      led_totems, energy_today, daily_foot_traffic, created_at
            ",
        )
        .bind(new_store.owner_user_id.as_i32())
        .bind(&new_store.name)
        .bind(&new_store.location)
        .bind(new_store.kinetic_floors)
        .bind(new_store.led_totems)
        .bind(new_store.energy_today)
        .bind(new_store.daily_foot_traffic)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "owner already has a store"))?;

        Ok(row.into())
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, owner_user_id, name, location, kinetic_floors,
                   led_totems, energy_today, daily_foot_traffic, created_at
            FROM store
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_store_by_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, owner_user_id, name, location, kinetic_floors,
                   led_totems, energy_today, daily_foot_traffic, created_at
            FROM store
            WHERE owner_user_id = $1
            ",
        )
        .bind(owner.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, owner_user_id, name, location, kinetic_floors,
                   led_totems, energy_today, daily_foot_traffic, created_at
            FROM store
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_store_traffic(
        &self,
        new_traffic: NewStoreTraffic,
    ) -> Result<StoreTraffic, RepositoryError> {
        let row = sqlx::query_as::<_, StoreTrafficRow>(
            r"
            INSERT INTO store_traffic (store_id, pedestrians, energy_generated, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, store_id, pedestrians, energy_generated, date, created_at
            ",
        )
        .bind(new_traffic.store_id.as_i32())
        .bind(new_traffic.pedestrians)
        .bind(new_traffic.energy_generated)
        .bind(new_traffic.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "traffic snapshot already exists"))?;

        Ok(row.into())
    }

    async fn list_store_traffic(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreTraffic>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreTrafficRow>(
            r"
            SELECT id, store_id, pedestrians, energy_generated, date, created_at
            FROM store_traffic
            WHERE store_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(store_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
