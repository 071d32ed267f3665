//! Mail transports for invitations.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use campushub_core::config::{InvitationConfig, MailTransport};
use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::traits::mailer::{Mailer, OutgoingMail};

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Build a relay from configuration. Credentials are used when a
    /// username is configured.
    pub fn new(config: &InvitationConfig) -> AppResult<Self> {
        let smtp = &config.smtp;
        let transport = if smtp.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
                .port(smtp.port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| AppError::configuration(format!("Invalid SMTP relay: {e}")))?
                .port(smtp.port)
                .credentials(Credentials::new(
                    smtp.username.clone(),
                    smtp.password.clone(),
                ))
                .build()
        };

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn transport(&self) -> &str {
        "smtp"
    }

    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        let from = self
            .from_address
            .parse::<Mailbox>()
            .map_err(|e: AddressError| AppError::configuration(format!("Invalid from address: {e}")))?;
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e: AddressError| AppError::validation(format!("Invalid recipient address: {e}")))?;
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AppError::internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::external(format!("SMTP delivery failed: {e}")))?;
        Ok(())
    }
}

/// Writes messages to the application log instead of sending them.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn transport(&self) -> &str {
        "log"
    }

    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "Outgoing mail");
        Ok(())
    }
}

/// Mailer selected by configuration.
pub fn build_mailer(config: &InvitationConfig) -> AppResult<Arc<dyn Mailer>> {
    Ok(match config.transport {
        MailTransport::Smtp => Arc::new(SmtpMailer::new(config)?),
        MailTransport::Log => Arc::new(LogMailer),
    })
}
