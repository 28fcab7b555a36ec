//! In-memory record store.
//!
//! All tables live behind a single `RwLock`, so every check-then-write
//! happens under one write guard. Used by tests and the integration test
//! harness.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use energy_plus_core::{
    FriendshipId, FriendshipStatus, StoreId, StoreTrafficId, UserId, Username, WalkId,
};

use super::{RecordStore, RepositoryError};
use crate::models::{
    Friendship, NewStore, NewStoreTraffic, NewUser, NewWalk, Store, StoreTraffic, User, Walk,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    passwords: Vec<(UserId, String)>,
    walks: Vec<Walk>,
    friendships: Vec<Friendship>,
    stores: Vec<Store>,
    traffic: Vec<StoreTraffic>,
    next_id: i32,
}

impl Tables {
    /// Ids are shared across tables; only uniqueness within a table matters.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user_exists(&self, id: UserId) -> bool {
        self.users.iter().any(|u| u.id == id)
    }
}

/// Record store keeping every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a friendship without any pair or status checks.
    ///
    /// Lets tests set up histories the normal write path refuses, such as
    /// several rejected rows for one pair.
    #[cfg(test)]
    pub async fn insert_friendship_unchecked(
        &self,
        requester_id: UserId,
        recipient_id: UserId,
        status: FriendshipStatus,
    ) -> Friendship {
        let mut tables = self.tables.write().await;
        let friendship = Friendship {
            id: FriendshipId::new(tables.next_id()),
            requester_id,
            recipient_id,
            status,
            created_at: Utc::now(),
        };
        tables.friendships.push(friendship.clone());
        friendship
    }

    /// Remove a user row while leaving their walks and friendships behind.
    ///
    /// Simulates dangling references for tests.
    #[cfg(test)]
    pub async fn delete_user(&self, id: UserId) {
        let mut tables = self.tables.write().await;
        tables.users.retain(|u| u.id != id);
        tables.passwords.retain(|(user_id, _)| *user_id != id);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let user = User {
            id: UserId::new(tables.next_id()),
            username: new_user.username,
            display_name: new_user.display_name,
            role: new_user.role,
            created_at: Utc::now(),
        };
        tables.passwords.push((user.id, new_user.password_hash));
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| &u.username == username)
            .cloned())
    }

    async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        let Some(user) = tables.users.iter().find(|u| &u.username == username) else {
            return Ok(None);
        };
        let hash = tables
            .passwords
            .iter()
            .find(|(id, _)| *id == user.id)
            .map(|(_, hash)| hash.clone());

        Ok(hash.map(|h| (user.clone(), h)))
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.clone())
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    // =========================================================================
    // Walks
    // =========================================================================

    async fn create_walk(&self, new_walk: NewWalk) -> Result<Walk, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.user_exists(new_walk.user_id) {
            return Err(RepositoryError::NotFound);
        }

        let walk = Walk {
            id: WalkId::new(tables.next_id()),
            user_id: new_walk.user_id,
            distance: new_walk.distance,
            energy: new_walk.energy,
            duration: new_walk.duration,
            created_at: Utc::now(),
        };
        tables.walks.push(walk.clone());

        Ok(walk)
    }

    async fn list_walks(&self) -> Result<Vec<Walk>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.walks.clone())
    }

    async fn list_walks_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<Walk>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .walks
            .iter()
            .filter(|w| user_ids.contains(&w.user_id))
            .cloned()
            .collect())
    }

    // =========================================================================
    // Friendships
    // =========================================================================

    async fn create_friendship(
        &self,
        requester_id: UserId,
        recipient_id: UserId,
    ) -> Result<Friendship, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.user_exists(requester_id) || !tables.user_exists(recipient_id) {
            return Err(RepositoryError::NotFound);
        }

        if tables
            .friendships
            .iter()
            .any(|f| f.status.is_active() && f.connects(requester_id, recipient_id))
        {
            return Err(RepositoryError::Conflict(
                "an active friendship already exists".to_owned(),
            ));
        }

        let friendship = Friendship {
            id: FriendshipId::new(tables.next_id()),
            requester_id,
            recipient_id,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        };
        tables.friendships.push(friendship.clone());

        Ok(friendship)
    }

    async fn get_friendship(
        &self,
        id: FriendshipId,
    ) -> Result<Option<Friendship>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.friendships.iter().find(|f| f.id == id).cloned())
    }

    async fn list_friendships_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Friendship>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .friendships
            .iter()
            .filter(|f| f.involves(user_id))
            .cloned()
            .collect())
    }

    async fn transition_friendship(
        &self,
        id: FriendshipId,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Friendship, RepositoryError> {
        let mut tables = self.tables.write().await;

        let friendship = tables
            .friendships
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if friendship.status != from {
            return Err(RepositoryError::Conflict(format!(
                "friendship is {}",
                friendship.status
            )));
        }

        friendship.status = to;
        Ok(friendship.clone())
    }

    async fn delete_accepted_friendship(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;

        let before = tables.friendships.len();
        tables
            .friendships
            .retain(|f| !(f.status == FriendshipStatus::Accepted && f.connects(a, b)));

        if tables.friendships.len() == before {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Stores
    // =========================================================================

    async fn create_store(&self, new_store: NewStore) -> Result<Store, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.user_exists(new_store.owner_user_id) {
            return Err(RepositoryError::NotFound);
        }

        if tables
            .stores
            .iter()
            .any(|s| s.owner_user_id == new_store.owner_user_id)
        {
            return Err(RepositoryError::Conflict(
                "owner already has a store".to_owned(),
            ));
        }

        let store = Store {
            id: StoreId::new(tables.next_id()),
            owner_user_id: new_store.owner_user_id,
            name: new_store.name,
            location: new_store.location,
            kinetic_floors: new_store.kinetic_floors,
            led_totems: new_store.led_totems,
            energy_today: new_store.energy_today,
            daily_foot_traffic: new_store.daily_foot_traffic,
            created_at: Utc::now(),
        };
        tables.stores.push(store.clone());

        Ok(store)
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn get_store_by_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .stores
            .iter()
            .find(|s| s.owner_user_id == owner)
            .cloned())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.stores.clone())
    }

    // =========================================================================
    // Store traffic
    // =========================================================================

    async fn create_store_traffic(
        &self,
        new_traffic: NewStoreTraffic,
    ) -> Result<StoreTraffic, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.stores.iter().any(|s| s.id == new_traffic.store_id) {
            return Err(RepositoryError::NotFound);
        }

        let traffic = StoreTraffic {
            id: StoreTrafficId::new(tables.next_id()),
            store_id: new_traffic.store_id,
            pedestrians: new_traffic.pedestrians,
            energy_generated: new_traffic.energy_generated,
            date: new_traffic.date,
            created_at: Utc::now(),
        };
        tables.traffic.push(traffic.clone());

        Ok(traffic)
    }

    async fn list_store_traffic(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreTraffic>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .traffic
            .iter()
            .filter(|t| t.store_id == store_id)
            .cloned()
            .collect())
    }
}
