//! User profile route handlers.

use axum::extract::State;
use serde::Serialize;

use energy_plus_core::{UserId, Username};

use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::models::User;
use crate::services::stats::UserTotals;
use crate::services::{FriendshipService, StatsService};
use crate::state::AppState;

/// Public profile of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user: User,
    #[serde(flatten)]
    pub totals: UserTotals,
    pub friends_count: usize,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// GET /api/users/{id}
pub async fn profile(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>> {
    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(user_not_found)?;

    let totals = StatsService::new(state.store()).user_totals(id).await?;
    let friends = FriendshipService::new(state.store()).friends(id).await?;

    Ok(Json(UserProfile {
        user,
        totals,
        friends_count: friends.len(),
    }))
}

/// GET /api/users/by-username/{username}
pub async fn by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>> {
    // A malformed username can't match anyone.
    let username = Username::parse(&username).map_err(|_| user_not_found())?;

    let user = state
        .store()
        .get_user_by_username(&username)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(user))
}

/// GET /api/users/{id}/totals
pub async fn totals(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserTotals>> {
    let totals = StatsService::new(state.store()).user_totals(id).await?;
    Ok(Json(totals))
}
