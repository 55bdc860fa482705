use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Access token (JWT) claims.
///
/// `sub` is optional on the way in: a token that verifies but carries no subject
/// is rejected by the gate, not by the verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    pub exp: i64,
}

/// Signature check capability used by the authorization gate.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AccessTokenClaims, VerifyError>;
}

/// HS256 access-token signer/verifier over a shared secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("validation", &self.validation)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str, ttl_seconds: u64, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    /// Issue an access token for a logged-in user.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: Some(user_id.to_string()),
            email: Some(email.to_string()),
            iat: Some(now),
            exp: now + self.ttl_seconds as i64,
        };
        self.sign(&claims)
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::Internal
        })
    }
}

impl TokenVerifier for JwtService {
    fn verify(&self, token: &str) -> Result<AccessTokenClaims, VerifyError> {
        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let jwt = JwtService::new("test-secret", 3600, 0);
        let user_id = Uuid::new_v4();

        let token = jwt.issue(user_id, "a@a.com").unwrap();
        let claims = jwt.verify(&token).unwrap();

        assert_eq!(claims.sub.as_deref(), Some(user_id.to_string().as_str()));
        assert_eq!(claims.email.as_deref(), Some("a@a.com"));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret-a", 3600, 0);
        let verifier = JwtService::new("secret-b", 3600, 0);

        let token = issuer.issue(Uuid::new_v4(), "a@a.com").unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtService::new("test-secret", 3600, 0);
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: Some(Uuid::new_v4().to_string()),
            email: None,
            iat: Some(now - 7200),
            exp: now - 3600,
        };

        let token = jwt.sign(&claims).unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = JwtService::new("test-secret", 3600, 0);
        assert!(jwt.verify("SomeToken").is_err());
    }
}
