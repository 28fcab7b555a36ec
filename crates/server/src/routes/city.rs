//! City dashboard route handlers. City admins only.

use axum::extract::State;

use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::services::CityService;
use crate::services::city::{CityStats, StoreRollup};
use crate::state::AppState;

/// GET /api/city/stats
pub async fn stats(State(state): State<AppState>, auth: RequireAuth) -> Result<Json<CityStats>> {
    let stats = CityService::new(state.store())
        .city_stats(&auth.caller())
        .await?;
    Ok(Json(stats))
}

/// GET /api/city/stores
pub async fn store_rollup(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<StoreRollup>> {
    let rollup = CityService::new(state.store())
        .store_rollup(&auth.caller())
        .await?;
    Ok(Json(rollup))
}
