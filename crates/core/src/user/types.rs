//! User domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rupi_shared::types::UserId;

use super::error::UserError;
use crate::auth::verify_secret;

/// Avatar path every account starts with; never deleted from storage.
pub const DEFAULT_AVATAR: &str = "uploads/default.png";

/// A registered customer together with their bank account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Legal name.
    pub full_name: String,
    /// Display name chosen by the user.
    pub alias: Option<String>,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Argon2 hash of the transaction PIN, once set.
    pub pin_hash: Option<String>,
    /// Public path of the avatar image.
    pub avatar: String,
    /// Whether the registration email was confirmed.
    pub email_verified: bool,
    /// Ten digit account number.
    pub account_number: String,
    /// Current balance.
    pub balance: Decimal,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(&self.full_name)
    }

    /// Whether a transaction PIN is set.
    #[must_use]
    pub fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }

    /// Check a PIN against the stored hash.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` when no PIN is set or it does not match.
    pub fn check_pin(&self, pin: &str) -> Result<(), UserError> {
        let hash = self
            .pin_hash
            .as_deref()
            .ok_or_else(|| UserError::validation("PIN is not set"))?;
        if verify_secret(pin, hash)? {
            Ok(())
        } else {
            Err(UserError::validation("Invalid PIN"))
        }
    }

    /// Current value of a contact channel.
    #[must_use]
    pub fn contact(&self, kind: ContactKind) -> &str {
        match kind {
            ContactKind::Email => &self.email,
            ContactKind::Phone => &self.phone,
        }
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Legal name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Allocated account number.
    pub account_number: String,
}

/// Contact channels that are unique across users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// Email address.
    Email,
    /// Phone number.
    Phone,
}

impl ContactKind {
    /// Human readable label used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone number",
        }
    }
}
