//! Friendship domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use energy_plus_core::{FriendshipId, FriendshipStatus, UserId};

/// A friendship request between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: FriendshipId,
    /// User who sent the request.
    pub requester_id: UserId,
    /// User who may accept or reject it.
    pub recipient_id: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// Whether `user_id` is either party of this friendship.
    #[must_use]
    pub fn involves(&self, user_id: UserId) -> bool {
        self.requester_id == user_id || self.recipient_id == user_id
    }

    /// The party that is not `user_id`, if `user_id` is involved.
    #[must_use]
    pub fn counterpart(&self, user_id: UserId) -> Option<UserId> {
        if self.requester_id == user_id {
            Some(self.recipient_id)
        } else if self.recipient_id == user_id {
            Some(self.requester_id)
        } else {
            None
        }
    }

    /// Whether this friendship connects `a` and `b`, in either direction.
    #[must_use]
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.requester_id == a && self.recipient_id == b)
            || (self.requester_id == b && self.recipient_id == a)
    }
}

/// An incoming pending request enriched with the requester's names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    #[serde(flatten)]
    pub friendship: Friendship,
    pub requester_name: String,
    pub requester_username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friendship(requester: i32, recipient: i32) -> Friendship {
        Friendship {
            id: FriendshipId::new(1),
            requester_id: UserId::new(requester),
            recipient_id: UserId::new(recipient),
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_counterpart() {
        let f = friendship(1, 2);
        assert_eq!(f.counterpart(UserId::new(1)), Some(UserId::new(2)));
        assert_eq!(f.counterpart(UserId::new(2)), Some(UserId::new(1)));
        assert_eq!(f.counterpart(UserId::new(3)), None);
    }

    #[test]
    fn test_connects_is_undirected() {
        let f = friendship(1, 2);
        assert!(f.connects(UserId::new(1), UserId::new(2)));
        assert!(f.connects(UserId::new(2), UserId::new(1)));
        assert!(!f.connects(UserId::new(1), UserId::new(3)));
    }
}
