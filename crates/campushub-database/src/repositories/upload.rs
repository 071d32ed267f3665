//! Upload job and row result repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{PageRequest, PageResponse};
use campushub_entity::upload::{
    CreateUploadJob, NewRowResult, UploadJob, UploadRowResult, UploadStatus,
};

use crate::error::map_sqlx;
use crate::store::LedgerStore;

const ROW_NUMBER_KEY: &str = "upload_row_results_job_row_key";

/// Repository for the upload ledger.
#[derive(Debug, Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    /// Create a new upload repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for UploadRepository {
    async fn create_job(&self, job: &CreateUploadJob) -> AppResult<UploadJob> {
        sqlx::query_as::<_, UploadJob>(
            "INSERT INTO upload_jobs (tenant_id, uploaded_by, target_kind, file_name, status) \
             VALUES ($1, $2, $3, $4, 'PROCESSING') \
             RETURNING *",
        )
        .bind(job.tenant_id)
        .bind(job.uploaded_by)
        .bind(job.target_kind)
        .bind(&job.file_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to create upload job"))
    }

    async fn append_result(
        &self,
        job_id: Uuid,
        result: &NewRowResult,
    ) -> AppResult<UploadRowResult> {
        let inserted = sqlx::query_as::<_, UploadRowResult>(
            "INSERT INTO upload_row_results \
             (job_id, row_number, outcome, entity_id, error_message, raw_data) \
             SELECT $1, $2, $3, $4, $5, $6 \
             WHERE EXISTS (SELECT 1 FROM upload_jobs WHERE id = $1 AND status = 'PROCESSING') \
             RETURNING *",
        )
        .bind(job_id)
        .bind(result.row_number)
        .bind(result.outcome)
        .bind(result.entity_id)
        .bind(&result.error_message)
        .bind(&result.raw_data)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(ROW_NUMBER_KEY) => {
                AppError::conflict(format!(
                    "Row {} already recorded for job {job_id}",
                    result.row_number
                ))
            }
            _ => map_sqlx(e, "Failed to append row result"),
        })?;

        inserted.ok_or_else(|| {
            AppError::conflict(format!("Upload job {job_id} is not accepting results"))
        })
    }

    async fn finalize_job(
        &self,
        job_id: Uuid,
        status: UploadStatus,
        error_report: Option<&str>,
    ) -> AppResult<UploadJob> {
        if !status.is_terminal() {
            return Err(AppError::validation(format!(
                "Cannot finalize upload job with status {status}"
            )));
        }

        let finalized = sqlx::query_as::<_, UploadJob>(
            "UPDATE upload_jobs j SET \
                status = $2, \
                error_report = $3, \
                completed_at = NOW(), \
                total_rows = (SELECT COUNT(*)::INT FROM upload_row_results r WHERE r.job_id = j.id), \
                succeeded_rows = (SELECT COUNT(*)::INT FROM upload_row_results r \
                                  WHERE r.job_id = j.id AND r.outcome = 'SUCCESS'), \
                failed_rows = (SELECT COUNT(*)::INT FROM upload_row_results r \
                               WHERE r.job_id = j.id AND r.outcome <> 'SUCCESS') \
             WHERE j.id = $1 AND j.status = 'PROCESSING' \
             RETURNING j.*",
        )
        .bind(job_id)
        .bind(status)
        .bind(error_report)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to finalize upload job"))?;

        match finalized {
            Some(job) => Ok(job),
            None => match self.find_job(job_id).await? {
                Some(job) => Err(AppError::conflict(format!(
                    "Upload job {job_id} is already {}",
                    job.status
                ))),
                None => Err(AppError::not_found(format!("Upload job {job_id} not found"))),
            },
        }
    }

    async fn find_job(&self, id: Uuid) -> AppResult<Option<UploadJob>> {
        sqlx::query_as::<_, UploadJob>("SELECT * FROM upload_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, "Failed to find upload job"))
    }

    async fn list_jobs(
        &self,
        tenant_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<UploadJob>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM upload_jobs WHERE ($1::UUID IS NULL OR tenant_id = $1)",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to count upload jobs"))?;

        let jobs = sqlx::query_as::<_, UploadJob>(
            "SELECT * FROM upload_jobs WHERE ($1::UUID IS NULL OR tenant_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(tenant_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to list upload jobs"))?;

        Ok(PageResponse::new(
            jobs,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn list_results(&self, job_id: Uuid) -> AppResult<Vec<UploadRowResult>> {
        sqlx::query_as::<_, UploadRowResult>(
            "SELECT * FROM upload_row_results WHERE job_id = $1 ORDER BY row_number",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "Failed to list row results"))
    }

    async fn delete_job(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM upload_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx(e, "Failed to delete upload job"))?;
        Ok(result.rows_affected() > 0)
    }
}
