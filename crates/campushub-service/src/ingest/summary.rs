//! Job summary returned to the submitting administrator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campushub_entity::member::MemberKind;
use campushub_entity::upload::{NewRowResult, RowOutcome, UploadJob, UploadStatus};

/// One row that did not produce an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// 1-based row number.
    pub row_number: u32,
    /// Outcome recorded for the row.
    pub outcome: RowOutcome,
    /// Reason.
    pub message: String,
}

/// Outcome of an upload. Returned for every submission, degraded or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub job_id: Uuid,
    pub file_name: String,
    pub target_kind: MemberKind,
    pub status: UploadStatus,
    pub total_rows: i32,
    pub succeeded_rows: i32,
    /// Every row that did not produce an account, skipped rows included.
    pub failed_rows: i32,
    pub skipped_rows: i32,
    /// Job-level failure description.
    pub error_report: Option<String>,
    /// Failed and skipped rows in file order.
    pub errors: Vec<RowFailure>,
}

fn count(errors: &[RowFailure], outcome: RowOutcome) -> i32 {
    errors.iter().filter(|e| e.outcome == outcome).count() as i32
}

/// Running totals of the rows recorded for a job.
#[derive(Debug, Default)]
pub(crate) struct RowTally {
    pub succeeded: i32,
    pub errors: Vec<RowFailure>,
}

impl RowTally {
    /// Count a row result that reached the ledger.
    pub fn record(&mut self, result: &NewRowResult) {
        if result.outcome == RowOutcome::Success {
            self.succeeded += 1;
        } else {
            self.errors.push(RowFailure {
                row_number: result.row_number.max(0) as u32,
                outcome: result.outcome,
                message: result.error_message.clone().unwrap_or_default(),
            });
        }
    }

    /// Summary of a finalized job. Counts come from the ledger.
    pub fn into_summary(self, job: &UploadJob) -> UploadSummary {
        UploadSummary {
            job_id: job.id,
            file_name: job.file_name.clone(),
            target_kind: job.target_kind,
            status: job.status,
            total_rows: job.total_rows,
            succeeded_rows: job.succeeded_rows,
            failed_rows: job.failed_rows,
            skipped_rows: count(&self.errors, RowOutcome::Skipped),
            error_report: job.error_report.clone(),
            errors: self.errors,
        }
    }

    /// Summary from local totals for a job the ledger could not close.
    pub fn degraded(self, job: &UploadJob, error_report: String) -> UploadSummary {
        let failed = self.errors.len() as i32;
        UploadSummary {
            job_id: job.id,
            file_name: job.file_name.clone(),
            target_kind: job.target_kind,
            status: UploadStatus::Failed,
            total_rows: self.succeeded + failed,
            succeeded_rows: self.succeeded,
            failed_rows: failed,
            skipped_rows: count(&self.errors, RowOutcome::Skipped),
            error_report: Some(error_report),
            errors: self.errors,
        }
    }
}
