//! Account lifecycle state machine.
//!
//! The status is never written directly. It is derived from two facts,
//! `first_login_at` and `profile_completed`, except while an administrator
//! holds the account in [`AccountStatus::Suspended`]. Facts are only ever
//! set, never cleared, so no transition can return an account that has
//! logged in to `PENDING_SETUP`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::AccountStatus;
use campushub_core::AppError;

/// Something that happened to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The authentication collaborator saw the first successful login.
    FirstLogin,
    /// The profile collaborator reported a completed profile.
    ProfileCompleted,
    /// An administrator suspended the account.
    Suspend,
    /// An administrator lifted a suspension.
    Reinstate,
}

/// Rejected transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Reinstate was requested for an account that is not suspended.
    #[error("account is {0}, only SUSPENDED accounts can be reinstated")]
    NotSuspended(AccountStatus),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::conflict(err.to_string())
    }
}

/// The lifecycle-relevant state of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLifecycle {
    /// Current status.
    pub status: AccountStatus,
    /// First successful authentication.
    pub first_login_at: Option<DateTime<Utc>>,
    /// Whether the profile is complete.
    pub profile_completed: bool,
}

impl AccountLifecycle {
    /// State of a freshly provisioned account.
    pub fn provisioned() -> Self {
        Self {
            status: AccountStatus::PendingSetup,
            first_login_at: None,
            profile_completed: false,
        }
    }

    /// The status implied by the facts alone.
    pub fn derived_status(&self) -> AccountStatus {
        match (self.first_login_at, self.profile_completed) {
            (None, _) => AccountStatus::PendingSetup,
            (Some(_), true) => AccountStatus::Active,
            (Some(_), false) => AccountStatus::Incomplete,
        }
    }

    fn is_suspended(&self) -> bool {
        self.status == AccountStatus::Suspended
    }

    /// Apply an event, returning the next state.
    ///
    /// Repeating `FirstLogin`, `ProfileCompleted` or `Suspend` yields the
    /// same state. A suspended account records facts but keeps its status.
    pub fn transition(
        self,
        event: LifecycleEvent,
        now: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let mut next = self;
        match event {
            LifecycleEvent::FirstLogin => {
                if next.first_login_at.is_some() {
                    return Ok(self);
                }
                next.first_login_at = Some(now);
                if !next.is_suspended() {
                    next.status = next.derived_status();
                }
            }
            LifecycleEvent::ProfileCompleted => {
                next.profile_completed = true;
                if !next.is_suspended() {
                    next.status = next.derived_status();
                }
            }
            LifecycleEvent::Suspend => {
                next.status = AccountStatus::Suspended;
            }
            LifecycleEvent::Reinstate => {
                if !next.is_suspended() {
                    return Err(TransitionError::NotSuspended(next.status));
                }
                next.status = next.derived_status();
            }
        }
        Ok(next)
    }
}
