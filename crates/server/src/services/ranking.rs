//! Leaderboards.
//!
//! Entries are ordered by total energy descending, then total distance
//! descending, then user id ascending. Positions run `1..=N` with no shared
//! ranks.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use energy_plus_core::{UserId, Username};

use super::stats::{UserTotals, totals_by_user};
use super::{FriendshipService, ServiceError};
use crate::db::RecordStore;
use crate::models::User;

/// Which users a leaderboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingScope {
    /// Every registered user.
    Global,
    /// The user and their accepted friends.
    FriendsOf(UserId),
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub id: UserId,
    /// 1-based.
    pub position: usize,
    /// Display name.
    pub name: String,
    pub username: Username,
    /// Total kilometers.
    pub distance: f64,
    /// Total watt-hours.
    pub energy: f64,
    pub walks: u64,
}

fn compare(a: (&User, &UserTotals), b: (&User, &UserTotals)) -> Ordering {
    b.1.total_energy
        .total_cmp(&a.1.total_energy)
        .then_with(|| b.1.total_distance.total_cmp(&a.1.total_distance))
        .then_with(|| a.0.id.cmp(&b.0.id))
}

/// Rank `candidates` by their totals. Candidates missing from `totals`
/// rank with zeroed totals.
#[must_use]
pub fn rank(candidates: &[User], totals: &HashMap<UserId, UserTotals>) -> Vec<RankingEntry> {
    let zero = UserTotals::default();
    let mut rows: Vec<(&User, &UserTotals)> = candidates
        .iter()
        .map(|u| (u, totals.get(&u.id).unwrap_or(&zero)))
        .collect();

    rows.sort_by(|a, b| compare(*a, *b));

    rows.into_iter()
        .enumerate()
        .map(|(i, (user, t))| RankingEntry {
            id: user.id,
            position: i + 1,
            name: user.display_name.clone(),
            username: user.username.clone(),
            distance: t.total_distance,
            energy: t.total_energy,
            walks: t.total_walks,
        })
        .collect()
}

/// Ranking service.
pub struct RankingService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> RankingService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Compute the leaderboard for a scope.
    ///
    /// A friends scope for an unknown user yields only the (normally empty)
    /// friend set.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn ranking(&self, scope: RankingScope) -> Result<Vec<RankingEntry>, ServiceError> {
        let candidates = match scope {
            RankingScope::Global => self.store.list_users().await?,
            RankingScope::FriendsOf(user_id) => {
                let mut candidates = FriendshipService::new(self.store)
                    .friends(user_id)
                    .await?;
                if let Some(user) = self.store.get_user(user_id).await? {
                    candidates.push(user);
                }
                candidates
            }
        };

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = candidates.iter().map(|u| u.id).collect();
        let walks = self.store.list_walks_for_users(&ids).await?;
        let totals = totals_by_user(&walks);

        Ok(rank(&candidates, &totals))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use energy_plus_core::{FriendshipStatus, Role};

    use super::*;
    use crate::db::MemoryRecordStore;
    use crate::services::test_support::{user, user_row, walk, walk_row};

    fn totals(walks: &[crate::models::Walk]) -> HashMap<UserId, UserTotals> {
        totals_by_user(walks)
    }

    #[test]
    fn test_energy_then_distance_then_id() {
        let users = vec![
            user_row(1, "one"),
            user_row(2, "two"),
            user_row(3, "three"),
            user_row(4, "four"),
        ];
        let walks = vec![
            walk_row(1, 1, 2.0, 100.0),
            walk_row(2, 2, 3.0, 100.0),
            walk_row(3, 3, 1.0, 200.0),
            walk_row(4, 4, 2.0, 100.0),
        ];

        let ranking = rank(&users, &totals(&walks));
        let order: Vec<i32> = ranking.iter().map(|e| e.id.as_i32()).collect();
        assert_eq!(order, vec![3, 2, 1, 4]);
        let positions: Vec<usize> = ranking.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_candidates_without_walks_rank_last() {
        let users = vec![user_row(1, "idle"), user_row(2, "walker")];
        let walks = vec![walk_row(1, 2, 1.0, 50.0)];

        let ranking = rank(&users, &totals(&walks));
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].id, UserId::new(2));
        assert_eq!(ranking[1].walks, 0);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(rank(&[], &HashMap::new()).is_empty());
    }

    #[tokio::test]
    async fn test_global_ranking_scenario() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "maria.silva", Role::Citizen).await;
        let b = user(&store, "joao.santos", Role::Citizen).await;
        walk(&store, b.id, 38.7).await;
        walk(&store, a.id, 45.3).await;

        let ranking = RankingService::new(&store)
            .ranking(RankingScope::Global)
            .await
            .unwrap();

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].id, a.id);
        assert_eq!(ranking[0].position, 1);
        assert!((ranking[0].energy - 2265.0).abs() < 1e-9);
        assert_eq!(ranking[1].id, b.id);
        assert_eq!(ranking[1].position, 2);
        assert!((ranking[1].energy - 1935.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_friends_scope_includes_self_and_accepted_only() {
        let store = MemoryRecordStore::new();
        let a = user(&store, "aaa", Role::Citizen).await;
        let b = user(&store, "bbb", Role::Citizen).await;
        let c = user(&store, "ccc", Role::Citizen).await;
        let d = user(&store, "ddd", Role::Citizen).await;
        store
            .insert_friendship_unchecked(a.id, b.id, FriendshipStatus::Accepted)
            .await;
        store
            .insert_friendship_unchecked(c.id, a.id, FriendshipStatus::Pending)
            .await;
        walk(&store, d.id, 100.0).await;
        walk(&store, b.id, 1.0).await;

        let ranking = RankingService::new(&store)
            .ranking(RankingScope::FriendsOf(a.id))
            .await
            .unwrap();

        let ids: Vec<UserId> = ranking.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_friends_scope_unknown_user_is_empty() {
        let store = MemoryRecordStore::new();
        user(&store, "aaa", Role::Citizen).await;

        let ranking = RankingService::new(&store)
            .ranking(RankingScope::FriendsOf(UserId::new(777)))
            .await
            .unwrap();
        assert!(ranking.is_empty());
    }

    #[tokio::test]
    async fn test_ranking_is_idempotent() {
        let store = MemoryRecordStore::new();
        for (name, km) in [("aaa", 3.0), ("bbb", 3.0), ("ccc", 5.0)] {
            let u = user(&store, name, Role::Citizen).await;
            walk(&store, u.id, km).await;
        }

        let service = RankingService::new(&store);
        let first = service.ranking(RankingScope::Global).await.unwrap();
        let second = service.ranking(RankingScope::Global).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_store_global_ranking() {
        let store = MemoryRecordStore::new();
        let ranking = RankingService::new(&store)
            .ranking(RankingScope::Global)
            .await
            .unwrap();
        assert!(ranking.is_empty());
    }
}
