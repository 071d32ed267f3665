//! CampusHub server: bulk account provisioning for college tenants
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use campushub_core::config::{AppConfig, DatabaseBackend};
use campushub_core::error::AppError;
use campushub_core::traits::mailer::Mailer;
use campushub_database::store::{LedgerStore, MemberStore};
use campushub_database::{DatabasePool, MemberRepository, MemoryStore, UploadRepository};
use campushub_service::invitation::build_mailer;
use campushub_worker::InvitationWorker;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CAMPUSHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CampusHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Storage backend ──────────────────────────────────
    let members: Arc<dyn MemberStore>;
    let ledger: Arc<dyn LedgerStore>;
    let mut db_pool: Option<DatabasePool> = None;

    match config.database.backend {
        DatabaseBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db = DatabasePool::connect(&config.database).await?;
            db.health_check().await?;
            campushub_database::migration::run_migrations(db.pool()).await?;
            members = Arc::new(MemberRepository::new(db.pool().clone()));
            ledger = Arc::new(UploadRepository::new(db.pool().clone()));
            db_pool = Some(db);
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            members = store.clone();
            ledger = store;
        }
    }

    // ── Step 2: Mail transport ───────────────────────────────────
    let mailer: Arc<dyn Mailer> = build_mailer(&config.invitation)?;
    tracing::info!(transport = mailer.transport(), "Mail transport ready");

    // ── Step 3: Services ─────────────────────────────────────────
    let wiring = campushub_api::wire(config.clone(), members, ledger, mailer)?;

    // ── Step 4: Shutdown channel & invitation worker ─────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        let worker = InvitationWorker::new(wiring.dispatcher, config.worker.clone());
        let invitations = wiring.invitations;
        let worker_cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            worker.run(invitations, worker_cancel).await;
        }))
    } else {
        tracing::warn!("Invitation worker disabled; provisioned accounts will not be invited");
        None
    };

    // ── Step 5: Build and start HTTP server ──────────────────────
    let app = campushub_api::build_app(wiring.state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("CampusHub server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    if let Some(handle) = worker_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        let _ = tokio::time::timeout(grace, handle).await;
    }
    if let Some(db) = db_pool {
        db.close().await;
    }

    tracing::info!("CampusHub server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
