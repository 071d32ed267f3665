//! Invitation dispatcher: issues account-setup notifications.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use campushub_auth::SetupToken;
use campushub_core::config::InvitationConfig;
use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::traits::mailer::{Mailer, OutgoingMail};
use campushub_database::store::MemberStore;
use campushub_entity::member::{AccountStatus, TenantMember};

/// Sends and re-sends setup invitations.
///
/// Each call issues a fresh one-time setup token, replacing any earlier
/// one, and stamps `invitation_sent_at`. The account status is untouched.
#[derive(Debug, Clone)]
pub struct InvitationDispatcher {
    members: Arc<dyn MemberStore>,
    mailer: Arc<dyn Mailer>,
    setup_url_base: String,
    token_ttl: Duration,
}

impl InvitationDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        members: Arc<dyn MemberStore>,
        mailer: Arc<dyn Mailer>,
        config: &InvitationConfig,
    ) -> Self {
        Self {
            members,
            mailer,
            setup_url_base: config.setup_url_base.clone(),
            token_ttl: Duration::hours(config.setup_token_ttl_hours),
        }
    }

    /// Issue an invitation to `account_id`.
    pub async fn send_invitation(&self, account_id: Uuid) -> AppResult<TenantMember> {
        let member = self
            .members
            .find_member(account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;
        if member.account_status == AccountStatus::Suspended {
            return Err(AppError::conflict(format!(
                "Account {account_id} is suspended"
            )));
        }

        let token = SetupToken::generate();
        let now = Utc::now();
        let expires_at = now + self.token_ttl;
        let member = self
            .members
            .record_invitation(account_id, now, token.digest(), expires_at)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

        let mail = OutgoingMail {
            to: member.email.clone(),
            subject: "Set up your CampusHub account".to_string(),
            body: format!(
                "Hello {name},\n\n\
                 An account has been created for you. Open the link below to choose \
                 your password and finish setting up your profile:\n\n\
                 {base}?token={token}\n\n\
                 The link expires on {expires}.\n",
                name = member.full_name,
                base = self.setup_url_base,
                token = token.token(),
                expires = expires_at.format("%Y-%m-%d %H:%M UTC"),
            ),
        };

        if let Err(e) = self.mailer.send(mail).await {
            warn!(
                %account_id,
                transport = self.mailer.transport(),
                error = %e,
                "Invitation delivery failed"
            );
            return Err(AppError::external(format!(
                "Invitation for account {account_id} could not be delivered: {}",
                e.message
            )));
        }

        info!(
            %account_id,
            transport = self.mailer.transport(),
            "Invitation sent"
        );
        Ok(member)
    }
}
