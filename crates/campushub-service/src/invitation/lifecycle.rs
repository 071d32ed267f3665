//! Account service: invitation resend and lifecycle events.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_database::store::MemberStore;
use campushub_entity::member::{LifecycleEvent, TenantMember};

use super::dispatcher::InvitationDispatcher;
use crate::context::RequestContext;

/// Attempts before a contended lifecycle write gives up.
const MAX_LIFECYCLE_ATTEMPTS: usize = 5;

/// Operations on provisioned accounts.
#[derive(Debug, Clone)]
pub struct AccountService {
    members: Arc<dyn MemberStore>,
    dispatcher: Arc<InvitationDispatcher>,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(members: Arc<dyn MemberStore>, dispatcher: Arc<InvitationDispatcher>) -> Self {
        Self {
            members,
            dispatcher,
        }
    }

    /// Re-send the setup invitation on an administrator's request.
    pub async fn resend_invitation(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> AppResult<TenantMember> {
        ctx.require_admin()?;
        self.visible_member(ctx, account_id).await?;
        self.dispatcher.send_invitation(account_id).await
    }

    /// Record the account's first successful login. Later calls are no-ops.
    pub async fn record_first_login(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> AppResult<TenantMember> {
        ctx.require_lifecycle_reporter()?;
        self.apply(ctx, account_id, LifecycleEvent::FirstLogin).await
    }

    /// Record that the account's profile is complete.
    pub async fn record_profile_completion(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> AppResult<TenantMember> {
        ctx.require_lifecycle_reporter()?;
        self.apply(ctx, account_id, LifecycleEvent::ProfileCompleted)
            .await
    }

    /// Suspend an account.
    pub async fn suspend(&self, ctx: &RequestContext, account_id: Uuid) -> AppResult<TenantMember> {
        ctx.require_admin()?;
        self.apply(ctx, account_id, LifecycleEvent::Suspend).await
    }

    /// Lift a suspension. The status is recomputed from the account's facts.
    pub async fn reinstate(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
    ) -> AppResult<TenantMember> {
        ctx.require_admin()?;
        self.apply(ctx, account_id, LifecycleEvent::Reinstate).await
    }

    async fn visible_member(&self, ctx: &RequestContext, account_id: Uuid) -> AppResult<TenantMember> {
        self.members
            .find_member(account_id)
            .await?
            .filter(|m| ctx.can_access_tenant(m.tenant_id))
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))
    }

    /// Read, transition, and write back under optimistic concurrency.
    async fn apply(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        event: LifecycleEvent,
    ) -> AppResult<TenantMember> {
        for _ in 0..MAX_LIFECYCLE_ATTEMPTS {
            let member = self.visible_member(ctx, account_id).await?;
            let current = member.lifecycle();
            let next = current.transition(event, Utc::now())?;
            if next == current {
                return Ok(member);
            }

            if let Some(updated) = self
                .members
                .save_lifecycle(account_id, member.lifecycle_version, &next)
                .await?
            {
                info!(
                    %account_id,
                    event = ?event,
                    from = %current.status,
                    to = %next.status,
                    actor = %ctx.user_id,
                    "Account lifecycle updated"
                );
                return Ok(updated);
            }
        }
        Err(AppError::conflict(format!(
            "Account {account_id} is being modified concurrently"
        )))
    }
}
