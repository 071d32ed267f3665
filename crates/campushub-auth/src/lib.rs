//! # campushub-auth
//!
//! Credential primitives for CampusHub.
//!
//! ## Modules
//!
//! - `jwt`: bearer token claims, signing, and verification
//! - `password`: Argon2id hashing, temporary secrets, and setup tokens

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{SecretHasher, SetupToken, generate_temporary_secret};
