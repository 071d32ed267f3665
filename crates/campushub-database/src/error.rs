//! Mapping of sqlx failures onto application error kinds.

use campushub_core::error::{AppError, ErrorKind};

/// PostgreSQL SQLSTATE codes worth retrying.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Classify a sqlx error. Connectivity problems become
/// `ServiceUnavailable` so callers can retry them.
pub(crate) fn map_sqlx(err: sqlx::Error, context: &str) -> AppError {
    let kind = match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => ErrorKind::ServiceUnavailable,
        sqlx::Error::Database(db_err)
            if matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ) =>
        {
            ErrorKind::ServiceUnavailable
        }
        _ => ErrorKind::Database,
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}
