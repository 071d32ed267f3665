//! Outbound notification trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Delivery channel for account notifications.
///
/// Implemented over SMTP and over the application log in
/// `campushub-service`; tests substitute a recording implementation.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Transport name, used in logs.
    fn transport(&self) -> &str;

    /// Deliver one message.
    async fn send(&self, mail: OutgoingMail) -> AppResult<()>;
}
