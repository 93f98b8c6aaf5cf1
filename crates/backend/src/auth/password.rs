//! Password hashing and verification with Argon2.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::error::{ApiError, ApiResult};

/// Hashes a password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored Argon2 hash.
///
/// A malformed stored hash is a server problem, a mismatch is a client one.
pub fn verify_password(password: &str, password_hash: &str) -> ApiResult<()> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid password hash: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|err| {
            tracing::trace!("Password verification failed: {}", err);
            ApiError::unauthorized("Invalid email or password")
        })
}
