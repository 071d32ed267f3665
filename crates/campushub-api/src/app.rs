//! Application builder: wires stores, services, and router into an app.

use std::sync::Arc;

use axum::Router;

use campushub_auth::{JwtDecoder, SecretHasher};
use campushub_core::config::AppConfig;
use campushub_core::result::AppResult;
use campushub_core::traits::mailer::Mailer;
use campushub_database::store::{LedgerStore, MemberStore};
use campushub_service::{
    AccountService, InvitationDispatcher, InvitationQueue, InvitationReceiver, UploadLedger,
    UploadService,
};

use crate::router::build_router;
use crate::state::AppState;

/// Everything the server needs besides the listener.
#[derive(Debug)]
pub struct Wiring {
    /// Handler state.
    pub state: AppState,
    /// Dispatcher shared with the invitation worker.
    pub dispatcher: Arc<InvitationDispatcher>,
    /// Queue of accounts awaiting an invitation, for the worker to drain.
    pub invitations: InvitationReceiver,
}

/// Build every service over the given stores and mail transport.
pub fn wire(
    config: AppConfig,
    members: Arc<dyn MemberStore>,
    ledger_store: Arc<dyn LedgerStore>,
    mailer: Arc<dyn Mailer>,
) -> AppResult<Wiring> {
    // ── Auth ─────────────────────────────────────────────────────
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
    let hasher = Arc::new(SecretHasher::new(&config.auth)?);

    // ── Services ─────────────────────────────────────────────────
    let (queue, invitations) = InvitationQueue::new();
    let upload_ledger = Arc::new(UploadLedger::new(ledger_store));
    let upload_service = Arc::new(UploadService::new(
        Arc::clone(&upload_ledger),
        Arc::clone(&members),
        hasher,
        queue,
        &config.ingest,
        &config.auth,
    ));
    let dispatcher = Arc::new(InvitationDispatcher::new(
        Arc::clone(&members),
        mailer,
        &config.invitation,
    ));
    let account_service = Arc::new(AccountService::new(members, Arc::clone(&dispatcher)));

    let state = AppState {
        config: Arc::new(config),
        jwt_decoder,
        upload_service,
        upload_ledger,
        account_service,
    };

    Ok(Wiring {
        state,
        dispatcher,
        invitations,
    })
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}
