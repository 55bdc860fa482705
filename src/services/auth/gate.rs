//! Authorization gate: `Authorization` header → verified identity.
//!
//! Kept free of axum types so it can be driven directly from tests; the
//! middleware in `middleware::auth::access` is a thin wrapper around `authorize`.

use thiserror::Error;
use uuid::Uuid;

use crate::services::auth::jwt::TokenVerifier;

/// Why the gate refused a request.
///
/// All variants surface as the same 401 response; they are kept apart for logs
/// and tests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("malformed authorization header")]
    MalformedCredential,
    #[error("invalid token")]
    InvalidToken,
}

/// Identity resolved from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccessToken {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Run the gate over a raw header value.
///
/// The header must be `<scheme> <token>`; the scheme word itself is not
/// interpreted. The verifier is called at most once, and only for a well-formed
/// header.
pub fn authorize(
    header: Option<&str>,
    verifier: &dyn TokenVerifier,
) -> Result<VerifiedAccessToken, GateError> {
    let header = header.ok_or(GateError::Unauthenticated)?;
    let token = split_credential(header).ok_or(GateError::MalformedCredential)?;

    let claims = verifier
        .verify(token)
        .map_err(|_| GateError::InvalidToken)?;

    let sub = claims.sub.ok_or(GateError::Unauthenticated)?;
    let user_id = Uuid::parse_str(&sub).map_err(|_| GateError::InvalidToken)?;

    Ok(VerifiedAccessToken {
        user_id,
        email: claims.email,
    })
}

// "<scheme> <token>" → token. Exactly two non-empty parts.
fn split_credential(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if !scheme.is_empty() && !token.is_empty() => {
            Some(token)
        }
        _ => None,
    }
}
