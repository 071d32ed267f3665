//! # campushub-entity
//!
//! Domain entity models for CampusHub bulk provisioning. Every struct in
//! this crate represents a database table row or a domain value object.
//! Database entities derive `sqlx::FromRow`; status enums map onto
//! PostgreSQL enum types.

pub mod member;
pub mod upload;
pub mod user;
