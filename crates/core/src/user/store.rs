//! Persistence and delivery seams.

use rupi_shared::types::UserId;

use super::error::UserError;
use super::types::{ContactKind, NewUser, UserAccount};

/// Store trait for user persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait UserStore: Send + Sync {
    /// Find a user by ID.
    fn find_by_id(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<UserAccount>, UserError>> + Send;

    /// Find a user by login name.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserAccount>, UserError>> + Send;

    /// Return the user holding a contact value, if any.
    fn find_contact_owner(
        &self,
        kind: ContactKind,
        value: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, UserError>> + Send;

    /// Check whether an account number is allocated.
    fn account_number_exists(
        &self,
        account_number: &str,
    ) -> impl std::future::Future<Output = Result<bool, UserError>> + Send;

    /// Insert a new user.
    fn create(
        &self,
        input: NewUser,
    ) -> impl std::future::Future<Output = Result<UserAccount, UserError>> + Send;

    /// Persist the mutable fields of a user.
    fn save(
        &self,
        user: &UserAccount,
    ) -> impl std::future::Future<Output = Result<(), UserError>> + Send;
}

/// Fully formed outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// One-time code by email.
    EmailCode {
        /// Recipient address.
        to: String,
        /// Recipient name.
        name: String,
        /// Subject line.
        subject: String,
        /// Plaintext code.
        code: String,
        /// Validity in minutes.
        valid_minutes: u64,
    },
    /// One-time code by WhatsApp.
    WhatsappCode {
        /// Recipient phone number.
        phone: String,
        /// Plaintext code.
        code: String,
        /// Validity in minutes.
        valid_minutes: u64,
    },
    /// Security alert by email.
    Alert {
        /// Recipient address.
        to: String,
        /// Recipient name.
        name: String,
        /// Subject line.
        subject: String,
        /// Body text.
        detail: String,
    },
}

/// Delivers notifications over email or WhatsApp.
pub trait Notifier: Send + Sync {
    /// Send one notification.
    fn send(
        &self,
        notification: Notification,
    ) -> impl std::future::Future<Output = Result<(), UserError>> + Send;

    /// Ask the WhatsApp gateway whether `phone` can receive messages.
    ///
    /// `Ok(false)` means the gateway refused the number.
    fn check_phone(
        &self,
        phone: &str,
    ) -> impl std::future::Future<Output = Result<bool, UserError>> + Send;
}

/// Send a security alert to the account email.
///
/// Delivery failures are logged and swallowed: the change they report has
/// already been committed.
pub(crate) async fn send_alert<N: Notifier>(
    notifier: &N,
    user: &UserAccount,
    subject: &str,
    detail: &str,
) {
    let notification = Notification::Alert {
        to: user.email.clone(),
        name: user.display_name().to_string(),
        subject: subject.to_string(),
        detail: detail.to_string(),
    };
    if let Err(e) = notifier.send(notification).await {
        tracing::warn!(user_id = %user.id, error = %e, "failed to send security alert");
    }
}
