//! Upload ledger service.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{PageRequest, PageResponse};
use campushub_database::store::LedgerStore;
use campushub_entity::upload::{
    CreateUploadJob, NewRowResult, UploadJob, UploadRowResult, UploadStatus,
};

use crate::context::RequestContext;

/// A job together with its row results in file order.
#[derive(Debug, Clone, Serialize)]
pub struct UploadJobDetail {
    /// The job.
    pub job: UploadJob,
    /// Row results ordered by row number.
    pub results: Vec<UploadRowResult>,
}

/// Records upload jobs and their per-row results.
///
/// Results are append-only. Job counts are never supplied by callers; the
/// store recomputes them when the job is finalized.
#[derive(Debug, Clone)]
pub struct UploadLedger {
    store: Arc<dyn LedgerStore>,
}

impl UploadLedger {
    /// Creates a new ledger over `store`.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open a job in `PROCESSING`.
    pub async fn create_job(&self, job: &CreateUploadJob) -> AppResult<UploadJob> {
        let created = self.store.create_job(job).await?;
        info!(
            job_id = %created.id,
            tenant_id = %created.tenant_id,
            kind = created.target_kind.as_str(),
            file_name = %created.file_name,
            "Upload job opened"
        );
        Ok(created)
    }

    /// Append the outcome of one row.
    pub async fn append_result(
        &self,
        job_id: Uuid,
        result: &NewRowResult,
    ) -> AppResult<UploadRowResult> {
        self.store.append_result(job_id, result).await
    }

    /// Close a job with the given terminal status.
    pub async fn finalize_job(
        &self,
        job_id: Uuid,
        status: UploadStatus,
        error_report: Option<&str>,
    ) -> AppResult<UploadJob> {
        let job = self.store.finalize_job(job_id, status, error_report).await?;
        info!(
            job_id = %job.id,
            status = job.status.as_str(),
            total = job.total_rows,
            succeeded = job.succeeded_rows,
            failed = job.failed_rows,
            "Upload job finalized"
        );
        Ok(job)
    }

    /// Row results of a job in file order, without access checks.
    pub async fn results(&self, job_id: Uuid) -> AppResult<Vec<UploadRowResult>> {
        self.store.list_results(job_id).await
    }

    /// Get a job visible to the caller.
    ///
    /// Jobs of other tenants are reported as missing.
    pub async fn get_job(&self, ctx: &RequestContext, id: Uuid) -> AppResult<UploadJob> {
        ctx.require_admin()?;
        self.store
            .find_job(id)
            .await?
            .filter(|job| ctx.can_access_tenant(job.tenant_id))
            .ok_or_else(|| AppError::not_found(format!("Upload job {id} not found")))
    }

    /// Get a job with all of its row results.
    pub async fn job_detail(&self, ctx: &RequestContext, id: Uuid) -> AppResult<UploadJobDetail> {
        let job = self.get_job(ctx, id).await?;
        let results = self.store.list_results(job.id).await?;
        Ok(UploadJobDetail { job, results })
    }

    /// List jobs most recent first.
    ///
    /// Tenant administrators always see their own tenant. Cross-tenant
    /// callers see every tenant unless they pass a filter.
    pub async fn list_jobs(
        &self,
        ctx: &RequestContext,
        tenant_filter: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UploadJob>> {
        ctx.require_admin()?;
        let tenant_id = if ctx.role.is_cross_tenant() {
            tenant_filter
        } else {
            Some(ctx.tenant_id)
        };
        self.store.list_jobs(tenant_id, page).await
    }

    /// Delete a finished job and its results.
    pub async fn delete_job(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let job = self.get_job(ctx, id).await?;
        if !job.status.is_terminal() {
            return Err(AppError::conflict(format!(
                "Upload job {id} is still processing"
            )));
        }
        if !self.store.delete_job(id).await? {
            return Err(AppError::not_found(format!("Upload job {id} not found")));
        }
        info!(job_id = %id, deleted_by = %ctx.user_id, "Upload job deleted");
        Ok(())
    }
}
