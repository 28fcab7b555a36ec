//! Leaderboard route handler.

use axum::extract::State;
use serde::Deserialize;

use energy_plus_core::UserId;

use crate::error::Result;
use crate::extract::{Json, Query};
use crate::middleware::OptionalAuth;
use crate::services::ranking::RankingEntry;
use crate::services::{RankingScope, RankingService};
use crate::state::AppState;

/// Query parameters for the leaderboard.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingQuery {
    #[serde(default)]
    pub friends_only: bool,
    pub user_id: Option<UserId>,
}

impl RankingQuery {
    /// Resolve the scope. A friends-only request without `userId` uses the
    /// logged-in user, and falls back to the global board without one.
    #[must_use]
    pub fn scope(&self, caller: Option<UserId>) -> RankingScope {
        if !self.friends_only {
            return RankingScope::Global;
        }
        self.user_id
            .or(caller)
            .map_or(RankingScope::Global, RankingScope::FriendsOf)
    }
}

/// GET /api/ranking
pub async fn ranking(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<RankingEntry>>> {
    let scope = query.scope(user.map(|u| u.id));
    let entries = RankingService::new(state.store()).ranking(scope).await?;
    Ok(Json(entries))
}
