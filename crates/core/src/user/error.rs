//! User workflow errors.

use rupi_shared::AppError;
use thiserror::Error;

use crate::auth::HashError;
use crate::storage::StorageError;

/// Errors raised by the user, OTP and profile workflows.
#[derive(Debug, Error)]
pub enum UserError {
    /// Input or state rule violated.
    #[error("{0}")]
    Validation(String),

    /// Record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A code was issued too recently to send another.
    #[error("OTP already sent, please wait for {}", format_wait(.remaining_secs))]
    Cooldown {
        /// Seconds until a resend is allowed.
        remaining_secs: i64,
    },

    /// The code outlived its validity window.
    #[error("OTP expired")]
    Expired,

    /// The code does not match.
    #[error("Invalid OTP")]
    InvalidCode,

    /// Authentication failed.
    #[error("{0}")]
    Unauthorized(String),

    /// Hashing failed.
    #[error("hashing failed: {0}")]
    Hash(#[from] HashError),

    /// Avatar storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Code or alert could not be delivered.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn format_wait(remaining_secs: &i64) -> String {
    let remaining_secs = *remaining_secs;
    if remaining_secs > 60 {
        format!("{} minutes", remaining_secs / 60)
    } else {
        format!("{} seconds", remaining_secs.max(1))
    }
}

impl UserError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a notification error.
    #[must_use]
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(msg) => Self::Validation(msg),
            UserError::NotFound(msg) => Self::NotFound(msg),
            e @ (UserError::Cooldown { .. } | UserError::Expired | UserError::InvalidCode) => {
                Self::Validation(e.to_string())
            }
            UserError::Unauthorized(msg) => Self::Unauthorized(msg),
            UserError::Storage(e) => match e {
                StorageError::FileTooLarge { .. } | StorageError::InvalidMimeType { .. } => {
                    Self::Validation(e.to_string())
                }
                other => Self::ExternalService(other.to_string()),
            },
            UserError::Notification(msg) => Self::ExternalService(msg),
            UserError::Hash(e) => Self::Internal(e.to_string()),
            UserError::Repository(msg) => Self::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(45, "OTP already sent, please wait for 45 seconds")]
    #[case(60, "OTP already sent, please wait for 60 seconds")]
    #[case(61, "OTP already sent, please wait for 1 minutes")]
    #[case(150, "OTP already sent, please wait for 2 minutes")]
    #[case(0, "OTP already sent, please wait for 1 seconds")]
    fn test_cooldown_message(#[case] remaining_secs: i64, #[case] expected: &str) {
        assert_eq!(UserError::Cooldown { remaining_secs }.to_string(), expected);
    }

    #[rstest]
    #[case(UserError::Expired, 400, "OTP expired")]
    #[case(UserError::InvalidCode, 400, "Invalid OTP")]
    #[case(UserError::not_found("No pending email change request"), 404, "No pending email change request")]
    #[case(UserError::Unauthorized("Invalid username or password".into()), 401, "Invalid username or password")]
    #[case(UserError::repository("connection reset"), 500, "connection reset")]
    fn test_app_error_mapping(#[case] err: UserError, #[case] status: u16, #[case] message: &str) {
        let app: AppError = err.into();
        assert_eq!(app.status_code(), status);
        assert_eq!(app.message(), message);
    }

    #[test]
    fn test_avatar_rejections_are_client_errors() {
        let app: AppError = UserError::Storage(StorageError::invalid_mime_type("text/plain")).into();
        assert_eq!(app.status_code(), 400);
    }
}
