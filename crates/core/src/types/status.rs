//! Status and role enums for various entities.
//!
//! Both enums are closed sets. Authorization code matches on [`Role`]
//! exhaustively so adding a role forces every check site to be revisited.

use serde::{Deserialize, Serialize};

/// User role.
///
/// Persisted as its `snake_case` string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Pedestrian who records walks and competes in rankings.
    #[default]
    Citizen,
    /// Owner of exactly one participating store.
    StoreOwner,
    /// City administrator with access to city-wide dashboards.
    CityAdmin,
}

impl Role {
    /// Get the persisted string form of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::StoreOwner => "store_owner",
            Self::CityAdmin => "city_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Self::Citizen),
            "store_owner" => Ok(Self::StoreOwner),
            "city_admin" => Ok(Self::CityAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Friendship request status.
///
/// ```text
/// pending --accept--> accepted --unfriend--> (deleted)
/// pending --reject--> rejected (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    /// Get the persisted string form of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this status blocks a new request between the same pair.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// Whether a transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted | Self::Rejected)
        )
    }
}

impl std::fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid friendship status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_strings() {
        for role in [Role::Citizen, Role::StoreOwner, Role::CityAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::StoreOwner).unwrap();
        assert_eq!(json, "\"store_owner\"");
        let parsed: Role = serde_json::from_str("\"city_admin\"").unwrap();
        assert_eq!(parsed, Role::CityAdmin);
    }

    #[test]
    fn test_friendship_transitions() {
        use FriendshipStatus::{Accepted, Pending, Rejected};

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Rejected.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_friendship_active() {
        assert!(FriendshipStatus::Pending.is_active());
        assert!(FriendshipStatus::Accepted.is_active());
        assert!(!FriendshipStatus::Rejected.is_active());
    }
}
