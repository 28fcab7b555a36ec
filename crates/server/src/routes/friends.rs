//! Friend route handlers.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use energy_plus_core::{FriendshipId, Role, UserId};

use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::{Friendship, PendingRequest, User};
use crate::services::{FriendshipService, ServiceError};
use crate::state::AppState;

/// Friend request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    /// Username of the user to befriend.
    pub username: String,
}

/// Success marker response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/friends/request
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn send_request(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<FriendRequest>,
) -> Result<(StatusCode, Json<Friendship>)> {
    let friendship = FriendshipService::new(state.store())
        .send_request(user.id, &req.username)
        .await?;

    Ok((StatusCode::CREATED, Json(friendship)))
}

/// PUT /api/friends/{id}/accept
#[instrument(skip_all, fields(user_id = %user.id, friendship_id = %id))]
pub async fn accept(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<FriendshipId>,
) -> Result<Json<Friendship>> {
    let friendship = FriendshipService::new(state.store())
        .accept(user.id, id)
        .await?;
    Ok(Json(friendship))
}

/// PUT /api/friends/{id}/reject
#[instrument(skip_all, fields(user_id = %user.id, friendship_id = %id))]
pub async fn reject(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<FriendshipId>,
) -> Result<Json<Friendship>> {
    let friendship = FriendshipService::new(state.store())
        .reject(user.id, id)
        .await?;
    Ok(Json(friendship))
}

/// DELETE /api/friends/{id}
///
/// `id` is the friend's user id.
#[instrument(skip_all, fields(user_id = %user.id, friend_id = %friend_id))]
pub async fn unfriend(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(friend_id): Path<UserId>,
) -> Result<Json<SuccessResponse>> {
    FriendshipService::new(state.store())
        .unfriend(user.id, friend_id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/friends/{id}
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<User>>> {
    let friends = FriendshipService::new(state.store())
        .friends(user_id)
        .await?;
    Ok(Json(friends))
}

/// GET /api/friends/{id}/requests
///
/// Only the user themself or a city admin may read a user's pending requests.
pub async fn pending(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<PendingRequest>>> {
    let allowed = match user.role {
        Role::CityAdmin => true,
        Role::Citizen | Role::StoreOwner => user.id == user_id,
    };
    if !allowed {
        return Err(ServiceError::forbidden().into());
    }

    let requests = FriendshipService::new(state.store())
        .pending_requests(user_id)
        .await?;
    Ok(Json(requests))
}
