//! HTTP handlers.

pub mod product;
pub mod sale;

use axum::extract::State;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

/// `GET /health`: liveness plus a `SELECT 1` against the pool.
pub async fn health(State(state): State<AppState>) -> ApiResult<&'static str> {
    if state.db.health_check().await {
        Ok("OK")
    } else {
        Err(ApiError::new(ErrorCode::DatabaseError, "Database unavailable"))
    }
}
