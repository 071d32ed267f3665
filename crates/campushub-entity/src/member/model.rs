//! Tenant member (credential record) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::lifecycle::AccountLifecycle;
use super::profile::NewProfile;
use super::status::{AccountStatus, MemberKind};

/// A provisioned account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantMember {
    /// Unique member identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Profile kind.
    pub kind: MemberKind,
    /// Login email, stored lower-cased and unique across all tenants.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Argon2 PHC hash of the temporary secret (never serialized).
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the member must replace the temporary secret.
    pub must_change_password: bool,
    /// Lifecycle status.
    pub account_status: AccountStatus,
    /// Most recent invitation delivery time.
    pub invitation_sent_at: Option<DateTime<Utc>>,
    /// SHA-256 digest of the outstanding setup token (never serialized).
    #[serde(skip_serializing)]
    pub setup_token_hash: Option<String>,
    /// Expiry of the outstanding setup token.
    pub setup_token_expires_at: Option<DateTime<Utc>>,
    /// First successful authentication.
    pub first_login_at: Option<DateTime<Utc>>,
    /// Whether the profile-completion collaborator reported completion.
    pub profile_completed: bool,
    /// Optimistic concurrency counter for lifecycle writes.
    pub lifecycle_version: i32,
    /// Administrator whose upload created the member.
    pub created_by: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl TenantMember {
    /// The lifecycle facts of this account.
    pub fn lifecycle(&self) -> AccountLifecycle {
        AccountLifecycle {
            status: self.account_status,
            first_login_at: self.first_login_at,
            profile_completed: self.profile_completed,
        }
    }
}

/// Everything needed to create a member and its profile in one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Login email, already normalised.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Argon2 PHC hash of the temporary secret.
    pub password_hash: String,
    /// Uploading administrator.
    pub created_by: Option<Uuid>,
    /// Profile data.
    pub profile: NewProfile,
}

impl NewMember {
    /// Profile kind.
    pub fn kind(&self) -> MemberKind {
        self.profile.kind()
    }
}
