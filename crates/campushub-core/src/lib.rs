//! # campushub-core
//!
//! Core crate for CampusHub. Contains configuration schemas, pagination
//! types, collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other CampusHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
