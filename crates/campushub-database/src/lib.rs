//! # campushub-database
//!
//! Store traits consumed by the provisioning pipeline, their PostgreSQL
//! implementations, and an in-memory implementation for development and
//! tests.

pub mod connection;
pub(crate) mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use repositories::{MemberRepository, UploadRepository};
pub use store::{LedgerStore, MemberStore};
