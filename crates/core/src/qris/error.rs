//! QRIS errors.

use rupi_shared::AppError;
use thiserror::Error;

use crate::user::UserError;

/// Errors raised while decoding QRIS payloads or paying with them.
#[derive(Debug, Error)]
pub enum QrisError {
    /// The payload is not valid TLV or misses a required field.
    #[error("Invalid QRIS: {0}")]
    Malformed(String),

    /// The CRC field does not match the payload.
    #[error("Invalid QRIS checksum")]
    Checksum,

    /// The balance does not cover the payment.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Payment input violates a rule.
    #[error("{0}")]
    Validation(String),

    /// Loading the payer or checking their PIN failed.
    #[error(transparent)]
    User(#[from] UserError),

    /// Store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl QrisError {
    /// Create a malformed payload error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<QrisError> for AppError {
    fn from(err: QrisError) -> Self {
        match err {
            e @ (QrisError::Malformed(_) | QrisError::Checksum | QrisError::InsufficientBalance) => {
                Self::Validation(e.to_string())
            }
            QrisError::Validation(msg) => Self::Validation(msg),
            QrisError::User(e) => e.into(),
            QrisError::Repository(msg) => Self::Database(msg),
        }
    }
}
