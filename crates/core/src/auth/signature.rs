//! Credential-change signatures.
//!
//! After re-entering the current password or PIN the client receives a
//! signature bound to the user and to the current credential hash. Changing
//! the credential changes the hash, so a signature is good for one change.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Computes the signature for a user's current credential hash.
#[must_use]
pub fn sign_credential(secret: &str, user_id: Uuid, credential_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(credential_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks a presented signature in constant time.
#[must_use]
pub fn verify_signature(
    secret: &str,
    user_id: Uuid,
    credential_hash: &str,
    presented: &str,
) -> bool {
    let expected = sign_credential(secret, user_id, credential_hash);
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic_hex() {
        let id = Uuid::new_v4();
        let a = sign_credential("s", id, "$argon2id$hash");
        assert_eq!(a, sign_credential("s", id, "$argon2id$hash"));
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_binds_user_hash_and_secret() {
        let id = Uuid::new_v4();
        let sig = sign_credential("s", id, "h1");
        assert!(verify_signature("s", id, "h1", &sig));
        assert!(!verify_signature("s", id, "h2", &sig));
        assert!(!verify_signature("s", Uuid::new_v4(), "h1", &sig));
        assert!(!verify_signature("other", id, "h1", &sig));
        assert!(!verify_signature("s", id, "h1", "short"));
    }
}
