//! Background processing for CampusHub.
//!
//! Accounts provisioned by an upload are queued in-process; the worker
//! drains the queue and sends each account its setup invitation without
//! holding up the upload that created it.

pub mod runner;

pub use runner::InvitationWorker;
