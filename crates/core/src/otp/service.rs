//! OTP service implementation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rupi_shared::config::OtpConfig;
use rupi_shared::types::{OtpId, UserId};

use super::types::{IssueOutcome, OtpPurpose, OtpRecord, mask_phone};
use crate::auth::{generate_code, hash_secret, verify_secret};
use crate::user::{
    ContactKind, Notification, Notifier, UserAccount, UserError, UserStore, send_alert,
    validation,
};

const CODE_LENGTH: usize = 6;
const MAX_WINDOW_SECS: u64 = 86_400;

/// Store trait for OTP persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait OtpStore: Send + Sync {
    /// Find the live record for a (user, purpose) pair.
    fn find(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> impl std::future::Future<Output = Result<Option<OtpRecord>, UserError>> + Send;

    /// Atomically replace whatever record the pair holds.
    fn replace(
        &self,
        record: OtpRecord,
    ) -> impl std::future::Future<Output = Result<(), UserError>> + Send;

    /// Delete the record for a pair, if any.
    fn delete(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> impl std::future::Future<Output = Result<(), UserError>> + Send;
}

/// Service driving the one-time code lifecycle.
pub struct OtpService<U: UserStore, O: OtpStore, N: Notifier> {
    users: Arc<U>,
    otps: Arc<O>,
    notifier: Arc<N>,
    ttl: Duration,
    resend_lead: Duration,
    valid_minutes: u64,
}

fn window(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs.min(MAX_WINDOW_SECS)).unwrap_or_default())
}

impl<U: UserStore, O: OtpStore, N: Notifier> OtpService<U, O, N> {
    /// Create a new OTP service.
    #[must_use]
    pub fn new(users: Arc<U>, otps: Arc<O>, notifier: Arc<N>, config: OtpConfig) -> Self {
        Self {
            users,
            otps,
            notifier,
            ttl: window(config.ttl_secs),
            resend_lead: window(config.resend_lead_secs),
            valid_minutes: config.ttl_secs / 60,
        }
    }

    async fn load(&self, user_id: UserId) -> Result<UserAccount, UserError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UserError::not_found("User not found"))
    }

    /// Seconds until a resend is allowed, or `None` if it is allowed now.
    fn cooldown(&self, record: &OtpRecord, now: DateTime<Utc>) -> Option<i64> {
        let next_allowed = record.expires_at - self.resend_lead;
        (now < next_allowed).then(|| (next_allowed - now).num_seconds())
    }

    fn delivery(&self, user: &UserAccount, record: &OtpRecord, code: String) -> Notification {
        let pending = record.pending_value.clone();
        match record.purpose {
            OtpPurpose::ChangePhone => Notification::WhatsappCode {
                phone: pending.unwrap_or_else(|| user.phone.clone()),
                code,
                valid_minutes: self.valid_minutes,
            },
            OtpPurpose::ChangeEmail => Notification::EmailCode {
                to: pending.unwrap_or_else(|| user.email.clone()),
                name: user.display_name().to_string(),
                subject: record.purpose.subject().to_string(),
                code,
                valid_minutes: self.valid_minutes,
            },
            OtpPurpose::VerifyEmail | OtpPurpose::ForgotPassword => Notification::EmailCode {
                to: user.email.clone(),
                name: user.display_name().to_string(),
                subject: record.purpose.subject().to_string(),
                code,
                valid_minutes: self.valid_minutes,
            },
        }
    }

    /// Generate, store and dispatch a fresh code, replacing any previous one.
    async fn issue(
        &self,
        user: &UserAccount,
        purpose: OtpPurpose,
        pending_value: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        let code = generate_code(CODE_LENGTH);
        let record = OtpRecord {
            id: OtpId::new(),
            user_id: user.id,
            purpose,
            code_hash: hash_secret(&code)?,
            pending_value,
            expires_at: now + self.ttl,
        };
        let notification = self.delivery(user, &record, code);

        self.otps.replace(record).await?;
        self.notifier.send(notification).await?;

        tracing::info!(user_id = %user.id, purpose = %purpose, "otp issued");
        Ok(())
    }

    /// Load the pending record and check it against a presented code.
    ///
    /// An expired record is deleted before failing.
    async fn consume(
        &self,
        user: &UserAccount,
        purpose: OtpPurpose,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpRecord, UserError> {
        let record = self
            .otps
            .find(user.id, purpose)
            .await?
            .ok_or_else(|| UserError::not_found(purpose.missing_message()))?;

        if now > record.expires_at {
            self.otps.delete(user.id, purpose).await?;
            tracing::info!(user_id = %user.id, purpose = %purpose, "expired otp discarded");
            return Err(UserError::Expired);
        }

        if !verify_secret(code.trim(), &record.code_hash)? {
            return Err(UserError::InvalidCode);
        }

        Ok(record)
    }

    /// Start moving a contact channel to a new value.
    ///
    /// A repeated request for the same value inside the cooldown is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` when the value is malformed, equals the
    /// current value or belongs to another user.
    pub async fn request_change(
        &self,
        user_id: UserId,
        kind: ContactKind,
        new_value: &str,
        now: DateTime<Utc>,
    ) -> Result<IssueOutcome, UserError> {
        let purpose = OtpPurpose::change_of(kind);
        let value = validation::contact(kind, new_value)?;
        let user = self.load(user_id).await?;

        if user.contact(kind) == value {
            return Err(UserError::validation(format!(
                "New {} must be different from the current one",
                kind.label().to_lowercase()
            )));
        }
        self.ensure_available(&user, kind, &value).await?;

        if let Some(existing) = self.otps.find(user.id, purpose).await?
            && existing.pending_value.as_deref() == Some(value.as_str())
            && self.cooldown(&existing, now).is_some()
        {
            tracing::debug!(user_id = %user.id, purpose = %purpose, "otp request suppressed");
            return Ok(IssueOutcome::Suppressed);
        }

        if kind == ContactKind::Phone {
            self.ensure_reachable(&user, &value).await?;
        }

        self.issue(&user, purpose, Some(value), now).await?;
        Ok(IssueOutcome::Issued)
    }

    /// Reject numbers the gateway refuses. An unreachable gateway is logged
    /// and the request proceeds.
    async fn ensure_reachable(&self, user: &UserAccount, phone: &str) -> Result<(), UserError> {
        match self.notifier.check_phone(phone).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(UserError::validation("Number is not valid")),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "whatsapp number check failed");
                Ok(())
            }
        }
    }

    async fn ensure_available(
        &self,
        user: &UserAccount,
        kind: ContactKind,
        value: &str,
    ) -> Result<(), UserError> {
        match self.users.find_contact_owner(kind, value).await? {
            Some(owner) if owner != user.id => Err(UserError::validation(format!(
                "{} already registered",
                kind.label()
            ))),
            _ => Ok(()),
        }
    }

    /// Send the registration verification code.
    ///
    /// # Errors
    ///
    /// Returns an error when storing or dispatching the code fails.
    pub async fn issue_verification(
        &self,
        user: &UserAccount,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        self.issue(user, OtpPurpose::VerifyEmail, None, now).await
    }

    /// Send a new code for a pending request, keeping its pending value.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Cooldown` while the current code is too fresh and
    /// `UserError::NotFound` when nothing is pending.
    pub async fn resend(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        let user = self.load(user_id).await?;
        if purpose == OtpPurpose::VerifyEmail && user.email_verified {
            return Err(UserError::validation("Email already verified"));
        }

        let Some(record) = self.otps.find(user.id, purpose).await? else {
            if purpose == OtpPurpose::VerifyEmail {
                return self.issue(&user, purpose, None, now).await;
            }
            return Err(UserError::not_found(purpose.missing_message()));
        };

        if let Some(remaining_secs) = self.cooldown(&record, now) {
            return Err(UserError::Cooldown { remaining_secs });
        }

        self.issue(&user, purpose, record.pending_value, now).await
    }

    /// Confirm a pending change or the registration email.
    ///
    /// On success the pending value is applied, the record is deleted and a
    /// confirmation alert is sent.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` with nothing pending, `UserError::Expired`
    /// after deleting an expired record, and `UserError::InvalidCode` on
    /// mismatch.
    pub async fn verify(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, UserError> {
        if purpose == OtpPurpose::ForgotPassword {
            return Err(UserError::validation(
                "Password resets are completed with a new password",
            ));
        }

        let before = self.load(user_id).await?;
        if purpose == OtpPurpose::VerifyEmail && before.email_verified {
            return Err(UserError::validation("Email already verified"));
        }
        let record = self.consume(&before, purpose, code, now).await?;

        let mut user = before.clone();
        match purpose {
            OtpPurpose::ChangeEmail | OtpPurpose::ChangePhone => {
                let kind = if purpose == OtpPurpose::ChangeEmail {
                    ContactKind::Email
                } else {
                    ContactKind::Phone
                };
                let value = record
                    .pending_value
                    .ok_or_else(|| UserError::not_found(purpose.missing_message()))?;
                self.ensure_available(&user, kind, &value).await?;
                match kind {
                    ContactKind::Email => {
                        user.email = value;
                        user.email_verified = true;
                    }
                    ContactKind::Phone => user.phone = value,
                }
            }
            OtpPurpose::VerifyEmail => user.email_verified = true,
            OtpPurpose::ForgotPassword => {}
        }

        self.users.save(&user).await?;
        self.otps.delete(user.id, purpose).await?;
        tracing::info!(user_id = %user.id, purpose = %purpose, "otp verified");

        match purpose {
            OtpPurpose::ChangeEmail => {
                let detail = format!(
                    "The email address of your Rupi account was changed to {}.",
                    user.email
                );
                send_alert(
                    self.notifier.as_ref(),
                    &before,
                    "Your email address was changed",
                    &detail,
                )
                .await;
            }
            OtpPurpose::ChangePhone => {
                let detail = format!(
                    "The phone number of your Rupi account was changed to {}.",
                    mask_phone(&user.phone)
                );
                send_alert(
                    self.notifier.as_ref(),
                    &user,
                    "Your phone number was changed",
                    &detail,
                )
                .await;
            }
            OtpPurpose::VerifyEmail | OtpPurpose::ForgotPassword => {}
        }

        Ok(user)
    }

    /// Send a password reset code to the account email.
    ///
    /// Unknown usernames are answered the same way as known ones.
    ///
    /// # Errors
    ///
    /// Returns an error when storing or dispatching the code fails.
    pub async fn request_password_reset(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssueOutcome, UserError> {
        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            tracing::debug!("password reset requested for unknown username");
            return Ok(IssueOutcome::Suppressed);
        };

        let purpose = OtpPurpose::ForgotPassword;
        if let Some(existing) = self.otps.find(user.id, purpose).await?
            && self.cooldown(&existing, now).is_some()
        {
            return Ok(IssueOutcome::Suppressed);
        }

        self.issue(&user, purpose, None, now).await?;
        Ok(IssueOutcome::Issued)
    }

    /// Complete a password reset.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` for a weak or mismatched password and
    /// the same code errors as [`Self::verify`].
    pub async fn reset_password(
        &self,
        username: &str,
        code: &str,
        password: &str,
        confirm: &str,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        validation::password(password, confirm)?;

        let purpose = OtpPurpose::ForgotPassword;
        let mut user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| UserError::not_found(purpose.missing_message()))?;
        self.consume(&user, purpose, code, now).await?;

        user.password_hash = hash_secret(password)?;
        self.users.save(&user).await?;
        self.otps.delete(user.id, purpose).await?;
        tracing::info!(user_id = %user.id, "password reset");

        send_alert(
            self.notifier.as_ref(),
            &user,
            "Your password was reset",
            "The password of your Rupi account was reset with a one-time code.",
        )
        .await;
        Ok(())
    }
}
