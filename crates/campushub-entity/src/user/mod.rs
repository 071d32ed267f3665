//! Caller identity entities.

pub mod role;

pub use role::UserRole;
