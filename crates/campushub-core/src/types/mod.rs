//! Core type definitions used across the CampusHub workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
