//! OTP domain types.

use chrono::{DateTime, Utc};
use rupi_shared::types::{OtpId, UserId};

use crate::user::ContactKind;

/// What a one-time code confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    /// Move the account to a new email address.
    ChangeEmail,
    /// Move the account to a new phone number.
    ChangePhone,
    /// Confirm the email given at signup.
    VerifyEmail,
    /// Reset a forgotten password.
    ForgotPassword,
}

impl OtpPurpose {
    /// Stable storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChangeEmail => "change_email",
            Self::ChangePhone => "change_phone",
            Self::VerifyEmail => "verify_email",
            Self::ForgotPassword => "forgot_password",
        }
    }

    /// Parses a storage name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "change_email" => Some(Self::ChangeEmail),
            "change_phone" => Some(Self::ChangePhone),
            "verify_email" => Some(Self::VerifyEmail),
            "forgot_password" => Some(Self::ForgotPassword),
            _ => None,
        }
    }

    /// The change purpose for a contact channel.
    #[must_use]
    pub const fn change_of(kind: ContactKind) -> Self {
        match kind {
            ContactKind::Email => Self::ChangeEmail,
            ContactKind::Phone => Self::ChangePhone,
        }
    }

    /// Message used when no code is pending.
    #[must_use]
    pub const fn missing_message(self) -> &'static str {
        match self {
            Self::ChangeEmail => "No pending email change request",
            Self::ChangePhone => "No pending phone change request",
            Self::VerifyEmail => "No pending email verification request",
            Self::ForgotPassword => "No pending password reset request",
        }
    }

    pub(crate) const fn subject(self) -> &'static str {
        match self {
            Self::ChangeEmail => "Confirm your new email address",
            Self::ChangePhone => "Confirm your new phone number",
            Self::VerifyEmail => "Verify your email address",
            Self::ForgotPassword => "Reset your password",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    /// Record ID.
    pub id: OtpId,
    /// Owner.
    pub user_id: UserId,
    /// What the code confirms.
    pub purpose: OtpPurpose,
    /// Argon2 hash of the code.
    pub code_hash: String,
    /// Value applied on success, for change purposes.
    pub pending_value: Option<String>,
    /// End of validity.
    pub expires_at: DateTime<Utc>,
}

/// Result of an issue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// A fresh code was stored and dispatched.
    Issued,
    /// A live code for the same value is inside its cooldown; nothing happened.
    Suppressed,
}

/// Masks all but the last four characters of a phone number.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let tail: String = phone
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("*****{tail}")
}
