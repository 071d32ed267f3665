//! Upload service: drives one file through decode, validate, provision,
//! and record.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use campushub_auth::SecretHasher;
use campushub_core::config::{AuthConfig, IngestConfig};
use campushub_core::error::{AppError, ErrorKind};
use campushub_core::result::AppResult;
use campushub_database::store::MemberStore;
use campushub_entity::member::MemberKind;
use campushub_entity::upload::{CreateUploadJob, NewRowResult, RowOutcome, UploadJob, UploadStatus};

use super::decoder::{DecodedRow, RowDecoder};
use super::executor::{ProvisioningExecutor, SystemicFailureTracker};
use super::retry::RetryPolicy;
use super::schema::RecordSchema;
use super::summary::{RowTally, UploadSummary};
use super::validator::RowValidator;
use crate::context::RequestContext;
use crate::invitation::InvitationQueue;
use crate::ledger::UploadLedger;

/// Per-job state threaded through the row loop.
struct JobRun {
    tenant_id: Uuid,
    uploaded_by: Uuid,
    validator: RowValidator,
    tracker: SystemicFailureTracker,
}

/// Outcome of one row, plus the reason to stop if the store is failing.
struct RowStep {
    result: NewRowResult,
    abort: Option<String>,
}

/// Bulk provisioning entry point.
#[derive(Debug, Clone)]
pub struct UploadService {
    ledger: Arc<UploadLedger>,
    members: Arc<dyn MemberStore>,
    executor: ProvisioningExecutor,
    queue: InvitationQueue,
    retry: RetryPolicy,
    config: IngestConfig,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        ledger: Arc<UploadLedger>,
        members: Arc<dyn MemberStore>,
        hasher: Arc<SecretHasher>,
        queue: InvitationQueue,
        ingest: &IngestConfig,
        auth: &AuthConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(ingest);
        Self {
            executor: ProvisioningExecutor::new(
                Arc::clone(&members),
                hasher,
                auth.temporary_secret_length,
                retry,
            ),
            ledger,
            members,
            queue,
            retry,
            config: ingest.clone(),
        }
    }

    /// Submit a file of `kind` records for the caller's tenant.
    ///
    /// Row-level problems never fail the request; they are reported in the
    /// returned summary. Only authorization, oversized input, and failure
    /// to open a job are request errors.
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        kind: MemberKind,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<UploadSummary> {
        ctx.require_admin()?;
        if bytes.len() > self.config.max_file_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_file_size_bytes
            )));
        }
        self.run_job(ctx.user_id, ctx.tenant_id, kind, file_name, bytes)
            .await
    }

    /// Resubmit the failed rows of a finished job as a new job.
    pub async fn reprocess_failed(
        &self,
        ctx: &RequestContext,
        job_id: Uuid,
    ) -> AppResult<UploadSummary> {
        let job = self.ledger.get_job(ctx, job_id).await?;
        if !job.status.is_terminal() {
            return Err(AppError::conflict(format!(
                "Upload job {job_id} is still processing"
            )));
        }

        let failed: Vec<_> = self
            .ledger
            .results(job.id)
            .await?
            .into_iter()
            .filter(|r| r.outcome == RowOutcome::Failed)
            .collect();
        if failed.is_empty() {
            return Err(AppError::validation(format!(
                "Upload job {job_id} has no failed rows"
            )));
        }

        let schema = RecordSchema::for_kind(job.target_kind);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(schema.columns.iter().map(|c| c.name))
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to rebuild file", e))?;
        for result in &failed {
            let cells = schema.columns.iter().map(|c| {
                result
                    .raw_data
                    .get(c.name)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
            });
            writer.write_record(cells).map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to rebuild file", e)
            })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::internal(format!("Failed to rebuild file: {}", e.error())))?;

        info!(
            source_job = %job.id,
            rows = failed.len(),
            "Reprocessing failed rows"
        );
        self.run_job(
            ctx.user_id,
            job.tenant_id,
            job.target_kind,
            &reprocess_file_name(&job.file_name),
            &bytes,
        )
        .await
    }

    /// CSV template for `kind`.
    pub fn template(&self, kind: MemberKind) -> AppResult<String> {
        RecordSchema::for_kind(kind).template()
    }

    async fn run_job(
        &self,
        uploaded_by: Uuid,
        tenant_id: Uuid,
        kind: MemberKind,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<UploadSummary> {
        let job = self
            .ledger
            .create_job(&CreateUploadJob {
                tenant_id,
                uploaded_by,
                target_kind: kind,
                file_name: file_name.to_string(),
            })
            .await?;

        let decoder = match RowDecoder::new(bytes, RecordSchema::for_kind(kind)) {
            Ok(decoder) => decoder,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Upload rejected before any row was read");
                let report = format!("Invalid file: {e}");
                return Ok(self
                    .close(&job, RowTally::default(), UploadStatus::Failed, Some(report))
                    .await);
            }
        };

        let mut run = JobRun {
            tenant_id,
            uploaded_by,
            validator: RowValidator::new(Arc::clone(&self.members), self.retry, tenant_id, kind),
            tracker: SystemicFailureTracker::new(self.config.systemic_failure_threshold),
        };
        let mut tally = RowTally::default();
        let mut abort = None;
        let mut rows_read = 0_u32;

        for decoded in decoder {
            rows_read += 1;
            let step = self.process_row(&mut run, decoded).await;
            if let Err(e) = self.ledger.append_result(job.id, &step.result).await {
                error!(
                    job_id = %job.id,
                    row = step.result.row_number,
                    error = %e,
                    "Failed to record row result, aborting job"
                );
                abort = Some(format!(
                    "Aborted: row {} could not be recorded: {}",
                    step.result.row_number, e.message
                ));
                break;
            }
            tally.record(&step.result);
            if let Some(reason) = step.abort {
                error!(job_id = %job.id, reason = %reason, "Systemic failure, aborting job");
                abort = Some(reason);
                break;
            }
        }

        if rows_read == 0 {
            warn!(job_id = %job.id, "Upload has a header but no data rows");
            abort = Some("File contains no data rows".to_string());
        }
        let status = if abort.is_some() {
            UploadStatus::Failed
        } else {
            UploadStatus::Completed
        };
        Ok(self.close(&job, tally, status, abort).await)
    }

    async fn process_row(&self, run: &mut JobRun, decoded: DecodedRow) -> RowStep {
        let row = match decoded {
            DecodedRow::Malformed {
                row_number,
                error,
                snapshot,
            } => {
                debug!(row = row_number, error = %error, "Malformed row");
                return RowStep::recorded(NewRowResult::failed(
                    row_index(row_number),
                    error.to_string(),
                    snapshot,
                ));
            }
            DecodedRow::Empty { row_number } => {
                return RowStep::recorded(NewRowResult::skipped(
                    row_index(row_number),
                    "Blank row",
                    Value::Object(Map::new()),
                ));
            }
            DecodedRow::Record(row) => row,
        };
        let index = row_index(row.row_number);

        if row.is_blank() {
            return RowStep::recorded(NewRowResult::skipped(index, "Blank row", row.snapshot()));
        }

        let admitted = match run.validator.validate(&row).await {
            Ok(Ok(admitted)) => admitted,
            Ok(Err(reason)) => {
                debug!(row = row.row_number, reason = %reason, "Row rejected");
                return RowStep::recorded(NewRowResult::failed(
                    index,
                    reason.to_string(),
                    row.snapshot(),
                ));
            }
            Err(e) => return run.storage_failure(index, e, row.snapshot()),
        };

        match self
            .executor
            .provision(run.tenant_id, run.uploaded_by, &admitted)
            .await
        {
            Ok(member) => {
                run.tracker.record_success();
                self.queue.enqueue(member.id);
                RowStep::recorded(NewRowResult::success(index, member.id, admitted.snapshot))
            }
            Err(e) => run.storage_failure(index, e, admitted.snapshot),
        }
    }

    async fn close(
        &self,
        job: &UploadJob,
        tally: RowTally,
        status: UploadStatus,
        error_report: Option<String>,
    ) -> UploadSummary {
        match self
            .ledger
            .finalize_job(job.id, status, error_report.as_deref())
            .await
        {
            Ok(done) => {
                info!(
                    job_id = %done.id,
                    status = done.status.as_str(),
                    total = done.total_rows,
                    succeeded = done.succeeded_rows,
                    failed = done.failed_rows,
                    "Upload processed"
                );
                tally.into_summary(&done)
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to finalize upload job");
                let report = match error_report {
                    Some(report) => format!("{report}; job could not be finalized: {}", e.message),
                    None => format!("Job could not be finalized: {}", e.message),
                };
                tally.degraded(job, report)
            }
        }
    }
}

impl JobRun {
    /// Record a row that failed at the store and check the failure streak.
    fn storage_failure(&mut self, index: i32, e: AppError, snapshot: Value) -> RowStep {
        warn!(row = index, error = %e, "Row could not be provisioned");
        let abort = self.tracker.record_failure(&e).then(|| {
            format!(
                "Aborted after {} consecutive storage failures; last error: {}",
                self.tracker.consecutive(),
                e.message
            )
        });
        RowStep {
            result: NewRowResult::failed(index, e.message, snapshot),
            abort,
        }
    }
}

impl RowStep {
    fn recorded(result: NewRowResult) -> Self {
        Self {
            result,
            abort: None,
        }
    }
}

fn row_index(row_number: u32) -> i32 {
    i32::try_from(row_number).unwrap_or(i32::MAX)
}

/// `students.csv` becomes `students-reprocess.csv`.
fn reprocess_file_name(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-reprocess.{ext}"),
        _ => format!("{original}-reprocess.csv"),
    }
}
