//! Per-row audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::RowOutcome;

/// The recorded outcome of one input row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadRowResult {
    /// Unique result identifier.
    pub id: Uuid,
    /// Owning job.
    pub job_id: Uuid,
    /// 1-based position in the source file, header excluded.
    pub row_number: i32,
    /// Outcome.
    pub outcome: RowOutcome,
    /// Provisioned member id on success.
    pub entity_id: Option<Uuid>,
    /// Reason the row was not provisioned.
    pub error_message: Option<String>,
    /// Raw cell values keyed by header, for audit and replay.
    pub raw_data: serde_json::Value,
    /// When the result was recorded.
    pub created_at: DateTime<Utc>,
}

/// A result ready to be appended to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRowResult {
    /// 1-based row position.
    pub row_number: i32,
    /// Outcome.
    pub outcome: RowOutcome,
    /// Provisioned member id.
    pub entity_id: Option<Uuid>,
    /// Failure reason.
    pub error_message: Option<String>,
    /// Raw row snapshot.
    pub raw_data: serde_json::Value,
}

impl NewRowResult {
    /// A provisioned row.
    pub fn success(row_number: i32, entity_id: Uuid, raw_data: serde_json::Value) -> Self {
        Self {
            row_number,
            outcome: RowOutcome::Success,
            entity_id: Some(entity_id),
            error_message: None,
            raw_data,
        }
    }

    /// A rejected or failed row.
    pub fn failed(row_number: i32, reason: impl Into<String>, raw_data: serde_json::Value) -> Self {
        Self {
            row_number,
            outcome: RowOutcome::Failed,
            entity_id: None,
            error_message: Some(reason.into()),
            raw_data,
        }
    }

    /// A row that was not attempted.
    pub fn skipped(row_number: i32, reason: impl Into<String>, raw_data: serde_json::Value) -> Self {
        Self {
            row_number,
            outcome: RowOutcome::Skipped,
            entity_id: None,
            error_message: Some(reason.into()),
            raw_data,
        }
    }
}
