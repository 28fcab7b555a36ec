//! Authentication route handlers.
//!
//! Registration never logs the new user in; the client calls login next.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::services::auth::RegisterInput;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response wrapping a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Generic message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Register a new citizen or store owner.
///
/// POST /api/auth/register
#[instrument(skip(state, input), fields(username = %input.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = AuthService::new(state.store()).register(input).await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Log in with username and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, req), fields(username = %req.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.store())
        .login(&req.username, &req.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.username.as_str()));

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(UserResponse { user }))
}

/// Log out.
///
/// POST /api/auth/logout
#[instrument(skip_all)]
pub async fn logout(
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MessageResponse>> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    tracing::info!(user_id = %user.id, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

/// The logged-in user, fresh from the record store.
///
/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = state
        .store()
        .get_user(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unauthorized - Please log in".to_string()))?;

    Ok(Json(UserResponse { user }))
}
