//! Secret hashing and one-time credential generation.

pub mod hasher;
pub mod secret;

pub use hasher::SecretHasher;
pub use secret::{SetupToken, generate_temporary_secret};
