//! Provisioning executor: turns an admitted row into a stored account.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use campushub_auth::{SecretHasher, generate_temporary_secret};
use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_database::store::MemberStore;
use campushub_entity::member::{NewMember, TenantMember};

use super::retry::RetryPolicy;
use super::validator::AdmittedRow;

/// Creates credential and profile records for admitted rows.
#[derive(Debug, Clone)]
pub struct ProvisioningExecutor {
    store: Arc<dyn MemberStore>,
    hasher: Arc<SecretHasher>,
    secret_length: usize,
    retry: RetryPolicy,
}

impl ProvisioningExecutor {
    /// Creates a new executor.
    pub fn new(
        store: Arc<dyn MemberStore>,
        hasher: Arc<SecretHasher>,
        secret_length: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            secret_length,
            retry,
        }
    }

    /// Provision one account in `tenant_id`.
    ///
    /// The account starts in `PENDING_SETUP` with a random temporary secret
    /// that must be changed on first login. The plaintext is discarded once
    /// hashed. A uniqueness race lost to a concurrent writer surfaces as
    /// `Conflict`.
    pub async fn provision(
        &self,
        tenant_id: Uuid,
        created_by: Uuid,
        row: &AdmittedRow,
    ) -> AppResult<TenantMember> {
        let secret = generate_temporary_secret(self.secret_length);
        let hasher = Arc::clone(&self.hasher);
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))??;

        let member = NewMember {
            tenant_id,
            email: row.email.clone(),
            full_name: row.full_name.clone(),
            password_hash,
            created_by: Some(created_by),
            profile: row.profile.clone(),
        };

        let store = &self.store;
        let new_member = &member;
        let created = self
            .retry
            .run("Provisioning", move || store.provision(new_member))
            .await?;

        debug!(
            member_id = %created.id,
            row = row.row_number,
            kind = created.kind.as_str(),
            "Account provisioned"
        );
        Ok(created)
    }
}

/// Detects a store that keeps failing so a job can stop early.
///
/// Only storage failures count. Any successful provisioning or failure of
/// another kind resets the streak.
#[derive(Debug, Clone)]
pub struct SystemicFailureTracker {
    threshold: u32,
    consecutive: u32,
}

impl SystemicFailureTracker {
    /// Tracker that trips after `threshold` consecutive storage failures.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
        }
    }

    /// Record a provisioning failure. Returns `true` once the job should abort.
    pub fn record_failure(&mut self, error: &AppError) -> bool {
        if error.is_storage_failure() {
            self.consecutive += 1;
        } else {
            self.consecutive = 0;
        }
        self.consecutive >= self.threshold
    }

    /// Record a successful provisioning.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Current streak of storage failures.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlakyStore, cheap_hasher};
    use campushub_core::error::ErrorKind;
    use campushub_entity::member::{AccountStatus, MemberKind, NewProfile};
    use serde_json::json;
    use std::time::Duration;

    fn admitted(email: &str) -> AdmittedRow {
        AdmittedRow {
            row_number: 1,
            email: email.to_string(),
            full_name: "Asha Rao".to_string(),
            profile: NewProfile::Trainer {
                department: Some("CSE".to_string()),
                specialization: None,
            },
            snapshot: json!({"Email": email}),
        }
    }

    fn executor(store: Arc<FlakyStore>) -> ProvisioningExecutor {
        ProvisioningExecutor::new(
            store,
            Arc::new(cheap_hasher()),
            16,
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_provisions_pending_account_with_hashed_secret() {
        let store = Arc::new(FlakyStore::default());
        let tenant = Uuid::new_v4();
        let admin = Uuid::new_v4();

        let member = executor(store.clone())
            .provision(tenant, admin, &admitted("asha@x.edu"))
            .await
            .unwrap();

        assert_eq!(member.tenant_id, tenant);
        assert_eq!(member.kind, MemberKind::Trainer);
        assert_eq!(member.account_status, AccountStatus::PendingSetup);
        assert!(member.must_change_password);
        assert!(!member.profile_completed);
        assert_eq!(member.created_by, Some(admin));
        assert!(member.password_hash.starts_with("$argon2id$"));
        assert!(store.inner.trainer_profile(member.id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let store = Arc::new(FlakyStore::default());
        store.fail_provisions(2, ErrorKind::ServiceUnavailable);

        let member = executor(store.clone())
            .provision(Uuid::new_v4(), Uuid::new_v4(), &admitted("a@x.edu"))
            .await;

        assert!(member.is_ok());
        assert_eq!(store.inner.member_count().await, 1);
    }

    #[tokio::test]
    async fn test_conflict_is_not_retried() {
        let store = Arc::new(FlakyStore::default());
        let exec = executor(store.clone());
        let tenant = Uuid::new_v4();
        exec.provision(tenant, Uuid::new_v4(), &admitted("a@x.edu"))
            .await
            .unwrap();

        let err = exec
            .provision(tenant, Uuid::new_v4(), &admitted("a@x.edu"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.inner.member_count().await, 1);
    }

    #[test]
    fn test_tracker_trips_on_consecutive_storage_failures() {
        let mut tracker = SystemicFailureTracker::new(3);
        let db = AppError::database("disk full");

        assert!(!tracker.record_failure(&db));
        assert!(!tracker.record_failure(&db));
        assert!(tracker.record_failure(&db));
    }

    #[test]
    fn test_tracker_resets() {
        let mut tracker = SystemicFailureTracker::new(2);
        let db = AppError::service_unavailable("pool timed out");

        assert!(!tracker.record_failure(&db));
        tracker.record_success();
        assert!(!tracker.record_failure(&db));
        assert!(!tracker.record_failure(&AppError::conflict("taken")));
        assert_eq!(tracker.consecutive(), 0);
        assert!(!tracker.record_failure(&db));
        assert!(tracker.record_failure(&db));
    }
}
