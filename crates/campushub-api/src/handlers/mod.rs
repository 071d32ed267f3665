//! Route handlers organized by domain.

pub mod account;
pub mod health;
pub mod upload;
