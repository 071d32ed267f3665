//! Bulk ingestion pipeline.
//!
//! A submitted file flows through four stages, one row at a time:
//!
//! - `decoder`: CSV records mapped onto the kind's recognised columns
//! - `validator`: required fields, formats, and uniqueness
//! - `executor`: one isolated credential-plus-profile write per row
//! - `service`: records every outcome in the upload ledger
//!
//! A bad row is recorded and skipped over; only a malformed header or a
//! sustained store outage ends a job early.

pub mod decoder;
pub mod executor;
pub mod retry;
pub mod schema;
pub mod service;
pub mod summary;
pub mod validator;

pub use decoder::{DecodeError, DecodedRow, RawRow, RowDecoder, RowError};
pub use executor::{ProvisioningExecutor, SystemicFailureTracker};
pub use retry::RetryPolicy;
pub use schema::RecordSchema;
pub use service::UploadService;
pub use summary::{RowFailure, UploadSummary};
pub use validator::{AdmittedRow, RejectReason, RowValidator};
