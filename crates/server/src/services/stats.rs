//! Per-user walk totals.

use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use energy_plus_core::UserId;

use super::ServiceError;
use crate::db::RecordStore;
use crate::models::Walk;

/// Totals over a user's walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTotals {
    pub total_walks: u64,
    /// Kilometers.
    pub total_distance: f64,
    /// Watt-hours.
    pub total_energy: f64,
}

impl UserTotals {
    /// Sum a set of walks. The caller is responsible for passing only one
    /// user's walks.
    #[must_use]
    pub fn from_walks(walks: &[Walk]) -> Self {
        walks.iter().fold(Self::default(), |mut acc, walk| {
            acc.add(walk);
            acc
        })
    }

    fn add(&mut self, walk: &Walk) {
        self.total_walks += 1;
        self.total_distance += walk.distance;
        self.total_energy += walk.energy;
    }
}

/// Group walks by owner and total each group.
#[must_use]
pub fn totals_by_user(walks: &[Walk]) -> HashMap<UserId, UserTotals> {
    let mut totals: HashMap<UserId, UserTotals> = HashMap::new();
    for walk in walks {
        totals.entry(walk.user_id).or_default().add(walk);
    }
    totals
}

/// Service for user statistics.
pub struct StatsService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> StatsService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Totals for one user. Zeroed when the user has no walks.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_totals(&self, user_id: UserId) -> Result<UserTotals, ServiceError> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(ServiceError::not_found("User"));
        }

        let walks = self.store.list_walks_for_users(&[user_id]).await?;
        Ok(UserTotals::from_walks(&walks))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use energy_plus_core::Role;

    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::services::test_support::{user, walk, walk_row};

    #[test]
    fn test_no_walks_is_zeroed() {
        let totals = UserTotals::from_walks(&[]);
        assert_eq!(totals.total_walks, 0);
        assert!(totals.total_distance.abs() < f64::EPSILON);
        assert!(totals.total_energy.abs() < f64::EPSILON);
    }

    #[test]
    fn test_totals_independent_of_order() {
        let walks = vec![
            walk_row(1, 1, 1.5, 75.0),
            walk_row(2, 1, 2.25, 112.5),
            walk_row(3, 1, 0.75, 37.5),
        ];
        let mut reversed = walks.clone();
        reversed.reverse();

        let a = UserTotals::from_walks(&walks);
        let b = UserTotals::from_walks(&reversed);

        assert_eq!(a.total_walks, 3);
        assert!((a.total_energy - 225.0).abs() < 1e-9);
        assert!((a.total_energy - b.total_energy).abs() < 1e-9);
        assert!((a.total_distance - b.total_distance).abs() < 1e-9);
    }

    #[test]
    fn test_totals_by_user_groups() {
        let walks = vec![
            walk_row(1, 1, 1.0, 50.0),
            walk_row(2, 2, 3.0, 150.0),
            walk_row(3, 1, 2.0, 100.0),
        ];

        let totals = totals_by_user(&walks);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&UserId::new(1)].total_walks, 2);
        assert!((totals[&UserId::new(1)].total_distance - 3.0).abs() < 1e-9);
        assert!((totals[&UserId::new(2)].total_energy - 150.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_user_totals_from_store() {
        let store = MemoryRecordStore::new();
        let maria = user(&store, "maria.silva", Role::Citizen).await;
        let joao = user(&store, "joao.santos", Role::Citizen).await;
        walk(&store, maria.id, 45.3).await;
        walk(&store, joao.id, 38.7).await;

        let service = StatsService::new(&store);
        let totals = service.user_totals(maria.id).await.unwrap();
        assert_eq!(totals.total_walks, 1);
        assert!((totals.total_energy - 2265.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_user_totals_zero_for_user_without_walks() {
        let store = MemoryRecordStore::new();
        let ana = user(&store, "ana.costa", Role::Citizen).await;

        let totals = StatsService::new(&store).user_totals(ana.id).await.unwrap();
        assert_eq!(totals, UserTotals::default());
    }

    #[tokio::test]
    async fn test_user_totals_unknown_user() {
        let store = MemoryRecordStore::new();
        let err = StatsService::new(&store)
            .user_totals(UserId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
