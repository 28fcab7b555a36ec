//! Walk domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use energy_plus_core::{UserId, WalkId};

/// A completed walk session. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Walk {
    pub id: WalkId,
    /// Owning user.
    pub user_id: UserId,
    /// Kilometers walked.
    pub distance: f64,
    /// Watt-hours credited, derived from `distance`.
    pub energy: f64,
    /// Seconds.
    pub duration: i32,
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a walk.
///
/// Built by the walk service after validation; `energy` is always derived
/// from `distance` there.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWalk {
    pub user_id: UserId,
    pub distance: f64,
    pub energy: f64,
    pub duration: i32,
}
