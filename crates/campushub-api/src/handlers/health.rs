//! Health check handler.

use axum::Json;
use axum::extract::State;

use campushub_core::config::DatabaseBackend;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = match state.config.database.backend {
        DatabaseBackend::Postgres => "postgres",
        DatabaseBackend::Memory => "memory",
    };
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    }))
}
