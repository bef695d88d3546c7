//! Argon2id password hashing for admin accounts.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Minimum admin password length.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum accepted password length; argon2 cost grows with input.
pub const MAX_PASSWORD_LENGTH: usize = 256;

#[derive(Debug, Error)]
pub enum PasswordError {
    /// Password doesn't match, or the stored hash is unreadable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Weak(String),

    #[error("failed to hash password")]
    Hash,
}

/// Hash computed once so that logins for unknown emails cost the same as
/// real ones.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("tonewood-timing-equalizer").ok());

/// Check length rules for a new password.
///
/// # Errors
///
/// Returns `PasswordError::Weak` describing the broken rule.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::Weak(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::Weak(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id with a random salt.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored PHC hash.
///
/// # Errors
///
/// Returns `PasswordError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::InvalidCredentials)
}

/// Spend the same work as [`verify_password`] for an unknown account.
pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}
