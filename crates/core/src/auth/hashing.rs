//! Secret hashing with Argon2id.
//!
//! Passwords, PINs and one-time codes are all stored as PHC strings produced
//! here.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur while hashing or verifying a secret.
#[derive(Debug, Error)]
pub enum HashError {
    /// Failed to hash the secret.
    #[error("failed to hash secret: {0}")]
    Hash(String),

    /// Failed to verify the secret.
    #[error("failed to verify secret: {0}")]
    Verify(String),

    /// Stored hash is not a PHC string.
    #[error("invalid hash format")]
    InvalidHash,
}

/// Hashes a secret using Argon2id.
///
/// # Errors
///
/// Returns `HashError::Hash` if hashing fails.
///
/// # Example
///
/// ```
/// use rupi_core::auth::hash_secret;
///
/// let hash = hash_secret("my_secure_password").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_secret(secret: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError::Hash(e.to_string()))
}

/// Verifies a secret against a stored hash.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns `HashError::InvalidHash` if the stored hash cannot be parsed.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, HashError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| HashError::InvalidHash)?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HashError::Verify(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = hash_secret("rahasia123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "rahasia123");
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_secret("123456").unwrap();
        assert!(verify_secret("123456", &hash).unwrap());
        assert!(!verify_secret("654321", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        assert_ne!(hash_secret("same").unwrap(), hash_secret("same").unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_secret("password", "not-a-hash");
        assert!(matches!(result, Err(HashError::InvalidHash)));
    }
}
