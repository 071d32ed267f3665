//! Upload job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::UploadStatus;
use crate::member::MemberKind;

/// One submitted file and its aggregate outcome.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadJob {
    /// Unique job identifier.
    pub id: Uuid,
    /// Tenant the rows are provisioned into.
    pub tenant_id: Uuid,
    /// Administrator who submitted the file.
    pub uploaded_by: Uuid,
    /// Kind of member the rows describe.
    pub target_kind: MemberKind,
    /// Original file name.
    pub file_name: String,
    /// Number of rows recorded.
    pub total_rows: i32,
    /// Rows that produced an account.
    pub succeeded_rows: i32,
    /// Rows that did not produce an account.
    pub failed_rows: i32,
    /// Current job status.
    pub status: UploadStatus,
    /// Job-level failure description, if any.
    pub error_report: Option<String>,
    /// When the job was submitted.
    pub created_at: DateTime<Utc>,
    /// When the job left `PROCESSING`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl UploadJob {
    /// Whether the stored counts add up.
    pub fn counts_consistent(&self) -> bool {
        self.succeeded_rows + self.failed_rows == self.total_rows
    }
}

/// Data required to open a new upload job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUploadJob {
    /// Tenant the rows are provisioned into.
    pub tenant_id: Uuid,
    /// Submitting administrator.
    pub uploaded_by: Uuid,
    /// Kind of member the rows describe.
    pub target_kind: MemberKind,
    /// Original file name.
    pub file_name: String,
}
