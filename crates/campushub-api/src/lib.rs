//! # campushub-api
//!
//! HTTP API layer for CampusHub built on Axum.
//!
//! Provides the upload and account endpoints, middleware (CORS, request
//! logging), extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Wiring, build_app, wire};
pub use error::ApiError;
pub use state::AppState;
