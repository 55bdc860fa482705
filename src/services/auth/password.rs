//! Password hashing (Argon2id, PHC string format).
use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("random source unavailable")]
    Rng,
    #[error("password hash error: {0}")]
    Hash(password_hash::Error),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    // 16 bytes of salt -> B64 (no padding) inside the PHC string
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes).map_err(|_| PasswordError::Rng)?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordError::Hash)?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;

    Ok(hash.to_string())
}

/// `Ok(false)` means the password does not match; `Err` means the stored hash is unusable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(PasswordError::Hash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e)),
    }
}
