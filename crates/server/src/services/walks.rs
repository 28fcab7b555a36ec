//! Walk submission and listing.

use serde::Deserialize;
use tracing::instrument;

use energy_plus_core::{MAX_WALK_KM, UserId, energy_for_distance};

use super::ServiceError;
use crate::db::RecordStore;
use crate::models::{NewWalk, Walk};

/// Walk data submitted by a client. Energy is always derived server-side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkInput {
    /// Kilometers.
    pub distance: f64,
    /// Seconds.
    pub duration: i32,
}

/// Walk service.
pub struct WalkService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> WalkService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Record a completed walk for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a negative, non-finite or
    /// longer than [`MAX_WALK_KM`] distance or a negative duration, and
    /// `ServiceError::NotFound` if the
    /// user doesn't exist.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn record_walk(&self, user_id: UserId, input: WalkInput) -> Result<Walk, ServiceError> {
        if !input.distance.is_finite() || input.distance < 0.0 {
            return Err(ServiceError::Validation(
                "Distance must be a non-negative number".to_owned(),
            ));
        }
        if input.distance > MAX_WALK_KM {
            return Err(ServiceError::Validation(format!(
                "Distance must be at most {MAX_WALK_KM} km"
            )));
        }
        if input.duration < 0 {
            return Err(ServiceError::Validation(
                "Duration must not be negative".to_owned(),
            ));
        }

        let walk = self
            .store
            .create_walk(NewWalk {
                user_id,
                distance: input.distance,
                energy: energy_for_distance(input.distance),
                duration: input.duration,
            })
            .await
            .map_err(|e| ServiceError::from_write(e, "User"))?;

        tracing::info!(walk_id = %walk.id, distance = walk.distance, "Walk recorded");

        Ok(walk)
    }

    /// A user's walks in insertion order. Empty for unknown users.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn walks_for_user(&self, user_id: UserId) -> Result<Vec<Walk>, ServiceError> {
        Ok(self.store.list_walks_for_users(&[user_id]).await?)
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
    async fn test_energy_is_derived_from_distance() {
        let store = MemoryRecordStore::new();
        let maria = user(&store, "maria.silva", Role::Citizen).await;

        let walk = WalkService::new(&store)
            .record_walk(
                maria.id,
                WalkInput {
                    distance: 45.3,
                    duration: 3600,
                },
            )
            .await
            .unwrap();

        assert!((walk.energy - 2265.0).abs() < 1e-9);
        assert_eq!(walk.user_id, maria.id);
    }

    #[tokio::test]
    async fn test_invalid_walks_are_not_stored() {
        let store = MemoryRecordStore::new();
        let maria = user(&store, "maria.silva", Role::Citizen).await;
        let service = WalkService::new(&store);

        for (distance, duration) in [
            (-1.0, 10),
            (f64::INFINITY, 10),
            (1.0, -10),
            (MAX_WALK_KM + 0.1, 10),
            (1e307, 10),
        ] {
            let err = service
                .record_walk(maria.id, WalkInput { distance, duration })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }

        assert!(service.walks_for_user(maria.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_longest_walk_is_accepted() {
        let store = MemoryRecordStore::new();
        let maria = user(&store, "maria.silva", Role::Citizen).await;

        let walk = WalkService::new(&store)
            .record_walk(
                maria.id,
                WalkInput {
                    distance: MAX_WALK_KM,
                    duration: 60,
                },
            )
            .await
            .unwrap();
        assert!(walk.energy.is_finite());
        assert!((walk.energy - MAX_WALK_KM * 50.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_walk_for_unknown_user() {
        let store = MemoryRecordStore::new();
        let err = WalkService::new(&store)
            .record_walk(
                UserId::new(5),
                WalkInput {
                    distance: 1.0,
                    duration: 60,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
