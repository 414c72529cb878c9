//! Mutation query errors.

use rupi_shared::AppError;
use thiserror::Error;

/// Errors raised by mutation queries.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Query parameters are invalid.
    #[error("{0}")]
    Validation(String),

    /// Mutation does not exist or belongs to someone else.
    #[error("Mutation not found")]
    NotFound,

    /// Store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl MutationError {
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

impl From<MutationError> for AppError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Validation(msg) => Self::Validation(msg),
            e @ MutationError::NotFound => Self::NotFound(e.to_string()),
            MutationError::Repository(msg) => Self::Database(msg),
        }
    }
}
