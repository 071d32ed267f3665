//! Upload job and per-row audit entities.

pub mod job;
pub mod row_result;
pub mod status;

pub use job::{CreateUploadJob, UploadJob};
pub use row_result::{NewRowResult, UploadRowResult};
pub use status::{RowOutcome, UploadStatus};
