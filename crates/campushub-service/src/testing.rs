//! Test doubles shared by the service unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use campushub_auth::SecretHasher;
use campushub_core::config::AuthConfig;
use campushub_core::error::{AppError, ErrorKind};
use campushub_core::result::AppResult;
use campushub_core::traits::mailer::{Mailer, OutgoingMail};
use campushub_core::types::{PageRequest, PageResponse};
use campushub_database::MemoryStore;
use campushub_database::store::{LedgerStore, MemberStore};
use campushub_entity::member::{AccountLifecycle, NewMember, TenantMember};
use campushub_entity::upload::{
    CreateUploadJob, NewRowResult, UploadJob, UploadRowResult, UploadStatus,
};

/// Argon2 parameters cheap enough for unit tests.
pub fn cheap_hasher() -> SecretHasher {
    SecretHasher::new(&AuthConfig {
        argon2_memory_kib: 8,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..AuthConfig::default()
    })
    .unwrap()
}

#[derive(Debug, Default)]
struct Fault {
    remaining: AtomicU32,
    kind: Mutex<Option<ErrorKind>>,
}

impl Fault {
    fn arm(&self, times: u32, kind: ErrorKind) {
        *self.kind.lock().unwrap() = Some(kind);
        self.remaining.store(times, Ordering::SeqCst);
    }

    fn trip(&self, what: &str) -> AppResult<()> {
        let fire = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        match (*self.kind.lock().unwrap()).clone() {
            Some(kind) if fire => Err(AppError::new(kind, format!("injected {what} failure"))),
            _ => Ok(()),
        }
    }
}

/// Memory store that fails selected operations on demand.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    provision: Fault,
    lookup: Fault,
    append: Fault,
    finalize: Fault,
}

impl FlakyStore {
    pub fn fail_provisions(&self, times: u32, kind: ErrorKind) {
        self.provision.arm(times, kind);
    }

    pub fn fail_lookups(&self, times: u32, kind: ErrorKind) {
        self.lookup.arm(times, kind);
    }

    pub fn fail_appends(&self, times: u32, kind: ErrorKind) {
        self.append.arm(times, kind);
    }

    pub fn fail_finalize(&self, times: u32, kind: ErrorKind) {
        self.finalize.arm(times, kind);
    }
}

#[async_trait]
impl MemberStore for FlakyStore {
    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.lookup.trip("lookup")?;
        self.inner.email_exists(email).await
    }

    async fn roll_number_exists(&self, tenant_id: Uuid, roll_number: &str) -> AppResult<bool> {
        self.lookup.trip("lookup")?;
        self.inner.roll_number_exists(tenant_id, roll_number).await
    }

    async fn provision(&self, member: &NewMember) -> AppResult<TenantMember> {
        self.provision.trip("provision")?;
        self.inner.provision(member).await
    }

    async fn find_member(&self, id: Uuid) -> AppResult<Option<TenantMember>> {
        self.inner.find_member(id).await
    }

    async fn find_member_by_email(&self, email: &str) -> AppResult<Option<TenantMember>> {
        self.inner.find_member_by_email(email).await
    }

    async fn record_invitation(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
        token_hash: &str,
        token_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<TenantMember>> {
        self.inner
            .record_invitation(id, sent_at, token_hash, token_expires_at)
            .await
    }

    async fn save_lifecycle(
        &self,
        id: Uuid,
        expected_version: i32,
        lifecycle: &AccountLifecycle,
    ) -> AppResult<Option<TenantMember>> {
        self.inner
            .save_lifecycle(id, expected_version, lifecycle)
            .await
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn create_job(&self, job: &CreateUploadJob) -> AppResult<UploadJob> {
        self.inner.create_job(job).await
    }

    async fn append_result(
        &self,
        job_id: Uuid,
        result: &NewRowResult,
    ) -> AppResult<UploadRowResult> {
        self.append.trip("append")?;
        self.inner.append_result(job_id, result).await
    }

    async fn finalize_job(
        &self,
        job_id: Uuid,
        status: UploadStatus,
        error_report: Option<&str>,
    ) -> AppResult<UploadJob> {
        self.finalize.trip("finalize")?;
        self.inner.finalize_job(job_id, status, error_report).await
    }

    async fn find_job(&self, id: Uuid) -> AppResult<Option<UploadJob>> {
        self.inner.find_job(id).await
    }

    async fn list_jobs(
        &self,
        tenant_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UploadJob>> {
        self.inner.list_jobs(tenant_id, page).await
    }

    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<UploadRowResult>> {
        self.inner.list_results(job_id).await
    }

    async fn delete_job(&self, id: Uuid) -> AppResult<bool> {
        self.inner.delete_job(id).await
    }
}

/// Mailer that keeps every message, optionally refusing delivery.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
    pub refuse: std::sync::atomic::AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn transport(&self) -> &str {
        "recording"
    }

    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(AppError::external("mail relay refused the message"));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}
