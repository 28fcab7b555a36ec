//! Walk route handlers.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use energy_plus_core::UserId;

use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::Walk;
use crate::services::WalkService;
use crate::services::walks::WalkInput;
use crate::state::AppState;

/// Record a walk for the logged-in user.
///
/// POST /api/walks
///
/// Energy is derived from distance; any energy figure in the body is ignored.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<WalkInput>,
) -> Result<(StatusCode, Json<Walk>)> {
    let walk = WalkService::new(state.store())
        .record_walk(user.id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(walk)))
}

/// GET /api/walks/user/{id}
pub async fn for_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Walk>>> {
    let walks = WalkService::new(state.store()).walks_for_user(id).await?;
    Ok(Json(walks))
}
