//! Invitation delivery configuration.

use serde::{Deserialize, Serialize};

/// How setup notifications leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Deliver through an SMTP relay.
    Smtp,
    /// Write the message to the application log only.
    #[default]
    Log,
}

/// Invitation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Delivery transport.
    #[serde(default)]
    pub transport: MailTransport,
    /// Sender address on outgoing mail.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Base URL of the account setup page; the setup token is appended.
    #[serde(default = "default_setup_url_base")]
    pub setup_url_base: String,
    /// Hours a setup token remains valid.
    #[serde(default = "default_token_ttl")]
    pub setup_token_ttl_hours: i64,
    /// SMTP relay settings, used when `transport = "smtp"`.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            from_address: default_from_address(),
            setup_url_base: default_setup_url_base(),
            setup_token_ttl_hours: default_token_ttl(),
            smtp: SmtpConfig::default(),
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay host name.
    #[serde(default = "default_smtp_host")]
    pub host: String,
    /// Relay port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Relay user name; empty disables authentication.
    #[serde(default)]
    pub username: String,
    /// Relay password.
    #[serde(default)]
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

fn default_from_address() -> String {
    "CampusHub <no-reply@campushub.local>".to_string()
}

fn default_setup_url_base() -> String {
    "http://localhost:3000/account/setup".to_string()
}

fn default_token_ttl() -> i64 {
    72
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}
