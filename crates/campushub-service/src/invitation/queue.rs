//! In-process queue of accounts awaiting their first invitation.

use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Receiving end, drained by the invitation worker.
pub type InvitationReceiver = mpsc::UnboundedReceiver<Uuid>;

/// Sending end handed to the upload pipeline.
///
/// Unbounded so that enqueueing never waits on mail delivery.
#[derive(Debug, Clone)]
pub struct InvitationQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl InvitationQueue {
    /// Create a queue and its receiver.
    pub fn new() -> (Self, InvitationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Schedule an invitation for `account_id`.
    pub fn enqueue(&self, account_id: Uuid) {
        if self.tx.send(account_id).is_err() {
            warn!(%account_id, "Invitation queue closed; invitation not scheduled");
        }
    }
}
