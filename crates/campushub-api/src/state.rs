//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use campushub_auth::JwtDecoder;
use campushub_core::config::AppConfig;
use campushub_service::{AccountService, UploadLedger, UploadService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token verification
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Bulk provisioning
    pub upload_service: Arc<UploadService>,
    /// Job and row result queries
    pub upload_ledger: Arc<UploadLedger>,
    /// Invitation resend and lifecycle events
    pub account_service: Arc<AccountService>,
}
