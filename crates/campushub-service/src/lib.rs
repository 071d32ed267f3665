//! # campushub-service
//!
//! Business logic for bulk account provisioning. Each service orchestrates
//! store traits, credential primitives, and the mail collaborator.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod ingest;
pub mod invitation;
pub mod ledger;

#[cfg(test)]
mod testing;

pub use context::RequestContext;
pub use ingest::{UploadService, UploadSummary};
pub use invitation::{AccountService, InvitationDispatcher, InvitationQueue, InvitationReceiver};
pub use ledger::{UploadJobDetail, UploadLedger};
