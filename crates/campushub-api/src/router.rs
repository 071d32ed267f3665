//! Route definitions for the CampusHub HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.ingest.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    let api_routes = Router::new()
        .merge(upload_routes())
        .merge(account_routes())
        .merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Upload endpoints. `POST /uploads/{id}` takes the member kind in the
/// path segment.
fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", get(handlers::upload::list_jobs))
        .route(
            "/uploads/templates/{kind}",
            get(handlers::upload::template),
        )
        .route(
            "/uploads/{id}",
            get(handlers::upload::get_job)
                .post(handlers::upload::submit)
                .delete(handlers::upload::delete_job),
        )
        .route("/uploads/{id}/reprocess", post(handlers::upload::reprocess))
}

/// Account endpoints: invitation resend and lifecycle events.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/{id}/invitation",
            post(handlers::account::resend_invitation),
        )
        .route("/accounts/{id}/suspend", post(handlers::account::suspend))
        .route("/accounts/{id}/reinstate", post(handlers::account::reinstate))
        .route(
            "/accounts/{id}/first-login",
            post(handlers::account::first_login),
        )
        .route(
            "/accounts/{id}/profile-completion",
            post(handlers::account::profile_completion),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
