use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use cache_aside::CacheResult;

/// GET /api/cache
pub async fn get_cached_value(State(state): State<AppState>) -> Result<Json<CacheResult>, ApiError> {
    let result = state.gateway.handle_request(&state.cache_key).await?;
    Ok(Json(result))
}
