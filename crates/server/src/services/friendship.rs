//! Friendship resolution and the friend request workflow.
//!
//! ```text
//! pending --accept--> accepted --unfriend--> (deleted)
//! pending --reject--> rejected (terminal)
//! ```
//!
//! Friendships are undirected once accepted. Only the recipient may accept
//! or reject a request. A rejected pair may send a fresh request.

use std::collections::{BTreeSet, HashMap};

use tracing::instrument;

use energy_plus_core::{FriendshipId, FriendshipStatus, UserId, Username};

use super::ServiceError;
use crate::db::RecordStore;
use crate::models::{Friendship, PendingRequest, User};

/// Display name used when a requester no longer exists.
pub const UNKNOWN_REQUESTER_NAME: &str = "Unknown user";
/// Username used when a requester no longer exists.
pub const UNKNOWN_REQUESTER_USERNAME: &str = "unknown";

/// Ids of users with an accepted friendship with `user_id`.
///
/// Self-referencing rows are skipped and duplicate pairs collapse.
#[must_use]
pub fn accepted_friend_ids(user_id: UserId, friendships: &[Friendship]) -> BTreeSet<UserId> {
    friendships
        .iter()
        .filter(|f| f.status == FriendshipStatus::Accepted)
        .filter_map(|f| f.counterpart(user_id))
        .filter(|id| *id != user_id)
        .collect()
}

/// Pending requests addressed to `user_id`, oldest first.
#[must_use]
pub fn pending_incoming(user_id: UserId, friendships: &[Friendship]) -> Vec<Friendship> {
    let mut pending: Vec<Friendship> = friendships
        .iter()
        .filter(|f| f.recipient_id == user_id && f.status == FriendshipStatus::Pending)
        .cloned()
        .collect();
    pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    pending
}

/// Friendship service.
pub struct FriendshipService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> FriendshipService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Accepted friends of a user, ordered by user id.
    ///
    /// Friends whose account no longer exists are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn friends(&self, user_id: UserId) -> Result<Vec<User>, ServiceError> {
        let friendships = self.store.list_friendships_for_user(user_id).await?;
        let ids: Vec<UserId> = accepted_friend_ids(user_id, &friendships)
            .into_iter()
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut friends = self.store.get_users(&ids).await?;
        friends.sort_by_key(|u| u.id);
        Ok(friends)
    }

    /// Incoming pending requests, enriched with the requester's names.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn pending_requests(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PendingRequest>, ServiceError> {
        let friendships = self.store.list_friendships_for_user(user_id).await?;
        let pending = pending_incoming(user_id, &friendships);

        let requester_ids: Vec<UserId> = pending.iter().map(|f| f.requester_id).collect();
        let requesters: HashMap<UserId, User> = self
            .store
            .get_users(&requester_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(pending
            .into_iter()
            .map(|friendship| {
                let (requester_name, requester_username) =
                    match requesters.get(&friendship.requester_id) {
                        Some(u) => (u.display_name.clone(), u.username.to_string()),
                        None => (
                            UNKNOWN_REQUESTER_NAME.to_owned(),
                            UNKNOWN_REQUESTER_USERNAME.to_owned(),
                        ),
                    };
                PendingRequest {
                    friendship,
                    requester_name,
                    requester_username,
                }
            })
            .collect())
    }

    // =========================================================================
    // Workflow
    // =========================================================================

    /// Send a friend request from `requester_id` to the user named
    /// `recipient_username`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed username or a
    /// request to yourself, `ServiceError::NotFound` if the recipient doesn't
    /// exist, and `ServiceError::Conflict` if the pair already has a pending
    /// or accepted friendship.
    #[instrument(skip(self), fields(requester_id = %requester_id))]
    pub async fn send_request(
        &self,
        requester_id: UserId,
        recipient_username: &str,
    ) -> Result<Friendship, ServiceError> {
        let username = Username::parse(recipient_username)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let recipient = self
            .store
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        if recipient.id == requester_id {
            return Err(ServiceError::Validation(
                "You cannot send a friend request to yourself".to_owned(),
            ));
        }

        let friendship = self
            .store
            .create_friendship(requester_id, recipient.id)
            .await
            .map_err(|e| ServiceError::from_write(e, "User"))?;

        tracing::info!(
            friendship_id = %friendship.id,
            recipient_id = %recipient.id,
            "Friend request sent"
        );

        Ok(friendship)
    }

    /// Accept a pending request addressed to `caller_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::respond`].
    pub async fn accept(
        &self,
        caller_id: UserId,
        id: FriendshipId,
    ) -> Result<Friendship, ServiceError> {
        self.respond(caller_id, id, FriendshipStatus::Accepted).await
    }

    /// Reject a pending request addressed to `caller_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::respond`].
    pub async fn reject(
        &self,
        caller_id: UserId,
        id: FriendshipId,
    ) -> Result<Friendship, ServiceError> {
        self.respond(caller_id, id, FriendshipStatus::Rejected).await
    }

    /// Move a pending request to `to` on behalf of its recipient.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the friendship doesn't exist,
    /// `ServiceError::Forbidden` if the caller isn't the recipient, and
    /// `ServiceError::Conflict` if the request is no longer pending.
    #[instrument(skip(self), fields(caller_id = %caller_id, friendship_id = %id))]
    async fn respond(
        &self,
        caller_id: UserId,
        id: FriendshipId,
        to: FriendshipStatus,
    ) -> Result<Friendship, ServiceError> {
        let friendship = self
            .store
            .get_friendship(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Friend request"))?;

        if friendship.recipient_id != caller_id {
            return Err(ServiceError::Forbidden(
                "Only the recipient can respond to a friend request".to_owned(),
            ));
        }

        if !friendship.status.can_transition_to(to) {
            return Err(ServiceError::Conflict(format!(
                "Friend request is already {}",
                friendship.status
            )));
        }

        let updated = self
            .store
            .transition_friendship(id, FriendshipStatus::Pending, to)
            .await
            .map_err(|e| ServiceError::from_write(e, "Friend request"))?;

        tracing::info!(status = %updated.status, "Friend request answered");

        Ok(updated)
    }

    /// Remove the accepted friendship between `caller_id` and `friend_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the two aren't friends.
    #[instrument(skip(self), fields(caller_id = %caller_id, friend_id = %friend_id))]
    pub async fn unfriend(&self, caller_id: UserId, friend_id: UserId) -> Result<(), ServiceError> {
        self.store
            .delete_accepted_friendship(caller_id, friend_id)
            .await
            .map_err(|e| ServiceError::from_write(e, "Friendship"))?;

        tracing::info!("Friendship removed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use energy_plus_core::Role;

    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::services::test_support::user;

    #[tokio::test]
    async fn test_request_accept_flow() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        let request = service.send_request(a.id, "bbb").await.unwrap();
        assert_eq!(request.status, FriendshipStatus::Pending);

        let pending = service.pending_requests(b.id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester_name, "aaa");
        assert_eq!(pending[0].requester_username, "aaa");

        assert!(service.friends(a.id).await.unwrap().is_empty());
        assert!(service.pending_requests(a.id).await.unwrap().is_empty());

        let accepted = service.accept(b.id, request.id).await.unwrap();
        assert_eq!(accepted.status, FriendshipStatus::Accepted);

        let a_friends = service.friends(a.id).await.unwrap();
        let b_friends = service.friends(b.id).await.unwrap();
        assert_eq!(a_friends.len(), 1);
        assert_eq!(a_friends[0].id, b.id);
        assert_eq!(b_friends[0].id, a.id);
        assert!(service.pending_requests(b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_friends_excludes_self_pending_and_rejected() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let c = user(&store, "ccc", Role::Citizen).await;
        let d = user(&store, "ddd", Role::Citizen).await;

        store
            .insert_friendship_unchecked(a.id, a.id, FriendshipStatus::Accepted)
            .await;
        store
            .insert_friendship_unchecked(a.id, b.id, FriendshipStatus::Pending)
            .await;
        store
            .insert_friendship_unchecked(c.id, a.id, FriendshipStatus::Rejected)
            .await;
        store
            .insert_friendship_unchecked(d.id, a.id, FriendshipStatus::Accepted)
            .await;

        let friends = FriendshipService::new(&store).friends(a.id).await.unwrap();
        let ids: Vec<UserId> = friends.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![d.id]);
    }

    #[tokio::test]
    async fn test_friends_dedupes_both_directions() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;

        store
            .insert_friendship_unchecked(a.id, b.id, FriendshipStatus::Accepted)
            .await;
        store
            .insert_friendship_unchecked(b.id, a.id, FriendshipStatus::Accepted)
            .await;

        let friends = FriendshipService::new(&store).friends(a.id).await.unwrap();
        assert_eq!(friends.len(), 1);
    }

    #[tokio::test]
    async fn test_friends_drops_deleted_users() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        store
            .insert_friendship_unchecked(a.id, b.id, FriendshipStatus::Accepted)
            .await;
        store.delete_user(b.id).await;

        let friends = FriendshipService::new(&store).friends(a.id).await.unwrap();
        assert!(friends.is_empty());
    }

    #[tokio::test]
    async fn test_pending_with_missing_requester_uses_fallback() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        store
            .insert_friendship_unchecked(a.id, b.id, FriendshipStatus::Pending)
            .await;
        store.delete_user(a.id).await;

        let pending = FriendshipService::new(&store)
            .pending_requests(b.id)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester_name, UNKNOWN_REQUESTER_NAME);
        assert_eq!(pending[0].requester_username, UNKNOWN_REQUESTER_USERNAME);
    }

    #[tokio::test]
    async fn test_duplicate_request_conflicts_either_direction() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        service.send_request(a.id, "bbb").await.unwrap();
        let err = service.send_request(a.id, "bbb").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err = service.send_request(b.id, "aaa").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_request_after_reject_is_allowed() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        let first = service.send_request(a.id, "bbb").await.unwrap();
        service.reject(b.id, first.id).await.unwrap();

        let second = service.send_request(a.id, "bbb").await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        let err = service.send_request(a.id, "aaa").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = service.send_request(a.id, "nobody").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = service.send_request(a.id, "no way").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_only_recipient_can_respond() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        user(&store, "bbb", Role::Citizen).await;
        let c = user(&store, "ccc", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        let request = service.send_request(a.id, "bbb").await.unwrap();

        let err = service.accept(a.id, request.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = service.reject(c.id, request.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = service
            .accept(a.id, FriendshipId::new(9999))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_respond_requires_pending() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        let request = service.send_request(a.id, "bbb").await.unwrap();
        service.reject(b.id, request.id).await.unwrap();

        let err = service.accept(b.id, request.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unfriend() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let service = FriendshipService::new(&store);

        let request = service.send_request(a.id, "bbb").await.unwrap();
        let err = service.unfriend(a.id, b.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        service.accept(b.id, request.id).await.unwrap();
        service.unfriend(b.id, a.id).await.unwrap();

        assert!(service.friends(a.id).await.unwrap().is_empty());
        // Pair is free again.
        service.send_request(b.id, "aaa").await.unwrap();
    }
}
