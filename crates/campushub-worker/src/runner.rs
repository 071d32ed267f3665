//! Invitation worker: drains the invitation queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use uuid::Uuid;

use campushub_core::config::WorkerConfig;
use campushub_service::{InvitationDispatcher, InvitationReceiver};

/// How long shutdown waits for in-flight deliveries.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends queued invitations with bounded concurrency.
#[derive(Debug)]
pub struct InvitationWorker {
    dispatcher: Arc<InvitationDispatcher>,
    config: WorkerConfig,
}

impl InvitationWorker {
    /// Create a new worker.
    pub fn new(dispatcher: Arc<InvitationDispatcher>, config: WorkerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Run until the cancel signal is received or every sender is gone.
    pub async fn run(&self, mut queue: InvitationReceiver, mut cancel: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency.max(1);
        tracing::info!(concurrency, "Invitation worker started");

        let semaphore = Arc::new(Semaphore::new(concurrency));

        loop {
            let account_id = tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Invitation worker received shutdown signal");
                        break;
                    }
                    continue;
                }
                next = queue.recv() => match next {
                    Some(id) => id,
                    None => {
                        tracing::info!("Invitation queue closed");
                        break;
                    }
                },
            };

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                let _permit = permit;
                deliver(&dispatcher, account_id).await;
            });
        }

        let mut abandoned = 0usize;
        while queue.try_recv().is_ok() {
            abandoned += 1;
        }
        if abandoned > 0 {
            tracing::warn!(
                abandoned,
                "Queued invitations were not sent before shutdown; resend them manually"
            );
        }

        tracing::info!("Invitation worker waiting for in-flight deliveries...");
        let _ = tokio::time::timeout(
            DRAIN_TIMEOUT,
            semaphore.acquire_many(concurrency as u32),
        )
        .await;
        tracing::info!("Invitation worker shut down complete");
    }
}

async fn deliver(dispatcher: &InvitationDispatcher, account_id: Uuid) {
    if let Err(e) = dispatcher.send_invitation(account_id).await {
        tracing::warn!(%account_id, error = %e, "Queued invitation failed");
    }
}
