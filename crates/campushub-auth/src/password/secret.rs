//! Temporary secrets and account setup tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};

/// Random alphanumeric secret assigned to a freshly provisioned account.
///
/// The plaintext is never stored or sent; the member sets a real password
/// through the setup link.
pub fn generate_temporary_secret(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(12))
        .map(char::from)
        .collect()
}

/// One-time reference embedded in an invitation.
///
/// Only [`SetupToken::digest`] is persisted.
#[derive(Debug, Clone)]
pub struct SetupToken {
    token: String,
    digest: String,
}

impl SetupToken {
    /// Generate a fresh 256-bit token.
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::thread_rng().r#gen();
        let token = URL_SAFE_NO_PAD.encode(bytes);
        let digest = Self::digest_of(&token);
        Self { token, digest }
    }

    /// URL-safe token to hand to the member.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Hex SHA-256 digest to store.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Digest of a presented token, for comparison with the stored one.
    pub fn digest_of(token: &str) -> String {
        Sha256::digest(token.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
