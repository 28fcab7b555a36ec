//! Store route handlers.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use energy_plus_core::StoreId;

use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::{Store, StoreTraffic};
use crate::services::city::StoreStats;
use crate::services::stores::{CreateStoreInput, RecordTrafficInput};
use crate::services::{CityService, StoreService};
use crate::state::AppState;

/// GET /api/stores
pub async fn list(State(state): State<AppState>, auth: RequireAuth) -> Result<Json<Vec<Store>>> {
    let stores = StoreService::new(state.store())
        .list_stores(&auth.caller())
        .await?;
    Ok(Json(stores))
}

/// POST /api/stores
#[instrument(skip_all, fields(user_id = %auth.0.id))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(input): Json<CreateStoreInput>,
) -> Result<(StatusCode, Json<Store>)> {
    let store = StoreService::new(state.store())
        .create_store(&auth.caller(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// GET /api/stores/my-store
pub async fn my_store(State(state): State<AppState>, auth: RequireAuth) -> Result<Json<Store>> {
    let store = StoreService::new(state.store())
        .my_store(&auth.caller())
        .await?;
    Ok(Json(store))
}

/// GET /api/stores/{id}/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<StoreId>,
) -> Result<Json<StoreStats>> {
    let stats = CityService::new(state.store())
        .store_stats(&auth.caller(), id, state.today())
        .await?;
    Ok(Json(stats))
}

/// POST /api/stores/{id}/traffic
#[instrument(skip_all, fields(user_id = %auth.0.id, store_id = %id))]
pub async fn record_traffic(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<StoreId>,
    Json(input): Json<RecordTrafficInput>,
) -> Result<(StatusCode, Json<StoreTraffic>)> {
    let traffic = StoreService::new(state.store())
        .record_traffic(&auth.caller(), id, input, state.today())
        .await?;
    Ok((StatusCode::CREATED, Json(traffic)))
}
