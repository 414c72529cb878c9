//! Credential primitives.
//!
//! This module provides:
//! - Argon2id hashing for passwords, PINs and one-time codes
//! - One-time code generation
//! - Signatures that gate password and PIN changes

mod code;
mod hashing;
mod signature;

pub use code::generate_code;
pub use hashing::{HashError, hash_secret, verify_secret};
pub use signature::{sign_credential, verify_signature};
