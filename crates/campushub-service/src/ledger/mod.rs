//! Upload ledger: the durable record of every job and row outcome.

pub mod service;

pub use service::{UploadJobDetail, UploadLedger};
