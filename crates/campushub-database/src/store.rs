//! Store traits consumed by the provisioning pipeline.
//!
//! The store is the sole arbiter of uniqueness: `provision` must reject a
//! duplicate email or tenant roll number with `ErrorKind::Conflict` even
//! when a prior lookup said the value was free.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use campushub_core::result::AppResult;
use campushub_core::types::{PageRequest, PageResponse};
use campushub_entity::member::{AccountLifecycle, NewMember, TenantMember};
use campushub_entity::upload::{
    CreateUploadJob, NewRowResult, UploadJob, UploadRowResult, UploadStatus,
};

/// Credential and profile storage.
#[async_trait]
pub trait MemberStore: Send + Sync + std::fmt::Debug + 'static {
    /// Whether any account in any tenant uses this email.
    async fn email_exists(&self, email: &str) -> AppResult<bool>;

    /// Whether a student in the tenant already holds this roll number.
    async fn roll_number_exists(&self, tenant_id: Uuid, roll_number: &str) -> AppResult<bool>;

    /// Create the credential record and its profile atomically.
    async fn provision(&self, member: &NewMember) -> AppResult<TenantMember>;

    /// Find a member by id.
    async fn find_member(&self, id: Uuid) -> AppResult<Option<TenantMember>>;

    /// Find a member by email.
    async fn find_member_by_email(&self, email: &str) -> AppResult<Option<TenantMember>>;

    /// Stamp an invitation and store the digest of its setup token.
    ///
    /// Returns `None` when the member does not exist.
    async fn record_invitation(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
        token_hash: &str,
        token_expires_at: DateTime<Utc>,
    ) -> AppResult<Option<TenantMember>>;

    /// Persist lifecycle facts if the stored version still matches.
    ///
    /// Returns `None` when the member is missing or was changed concurrently.
    async fn save_lifecycle(
        &self,
        id: Uuid,
        expected_version: i32,
        lifecycle: &AccountLifecycle,
    ) -> AppResult<Option<TenantMember>>;
}

/// Upload job and row result storage.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug + 'static {
    /// Open a job in `PROCESSING` with zero counts.
    async fn create_job(&self, job: &CreateUploadJob) -> AppResult<UploadJob>;

    /// Append one row result. Fails with `Conflict` if the job is no longer
    /// processing or the row number was already recorded.
    async fn append_result(
        &self,
        job_id: Uuid,
        result: &NewRowResult,
    ) -> AppResult<UploadRowResult>;

    /// Close a processing job, recomputing its counts from stored results.
    async fn finalize_job(
        &self,
        job_id: Uuid,
        status: UploadStatus,
        error_report: Option<&str>,
    ) -> AppResult<UploadJob>;

    /// Find a job by id.
    async fn find_job(&self, id: Uuid) -> AppResult<Option<UploadJob>>;

    /// List jobs most recent first, optionally restricted to one tenant.
    async fn list_jobs(
        &self,
        tenant_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UploadJob>>;

    /// All results of a job in row order.
    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<UploadRowResult>>;

    /// Delete a job and its results. Returns whether a job was removed.
    async fn delete_job(&self, id: Uuid) -> AppResult<bool>;
}
