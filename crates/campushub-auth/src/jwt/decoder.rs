//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use campushub_core::config::AuthConfig;
use campushub_core::error::AppError;

use super::claims::Claims;

/// Validates bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::unauthorized("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::unauthorized("Invalid token signature")
                    }
                    _ => AppError::unauthorized(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use campushub_core::ErrorKind;
    use campushub_entity::user::UserRole;
    use uuid::Uuid;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_round_trip_claims() {
        let cfg = config("unit-test-secret");
        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let token = JwtEncoder::new(&cfg)
            .issue(user, tenant, UserRole::Admin, chrono::Duration::minutes(5))
            .unwrap();

        let claims = JwtDecoder::new(&cfg).decode(&token).unwrap();
        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.tenant_id, tenant);
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = JwtEncoder::new(&config("one"))
            .issue(
                Uuid::new_v4(),
                Uuid::new_v4(),
                UserRole::Admin,
                chrono::Duration::minutes(5),
            )
            .unwrap();
        let err = JwtDecoder::new(&config("two")).decode(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn test_rejects_expired_token() {
        let cfg = config("unit-test-secret");
        let token = JwtEncoder::new(&cfg)
            .issue(
                Uuid::new_v4(),
                Uuid::new_v4(),
                UserRole::Admin,
                chrono::Duration::minutes(-10),
            )
            .unwrap();
        let err = JwtDecoder::new(&cfg).decode(&token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }
}
