//! Password hashing for the credential store.
//!
//! Passwords are only ever stored as salted argon2id hashes with the crate's
//! fixed default parameters; verification is constant-time inside the argon2
//! crate.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::ApiError;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Storage(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash. An unparseable stored hash
/// verifies as false rather than erroring; the caller reports the same
/// generic credentials failure either way.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
