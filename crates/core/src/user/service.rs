//! User service implementation.

use std::sync::Arc;

use rupi_shared::types::UserId;

use super::error::UserError;
use super::store::{Notifier, UserStore, send_alert};
use super::types::{ContactKind, NewUser, UserAccount};
use super::validation;
use crate::auth::{generate_code, hash_secret, sign_credential, verify_secret, verify_signature};

const ACCOUNT_NUMBER_LENGTH: usize = 10;
const ACCOUNT_NUMBER_ATTEMPTS: usize = 10;

/// Registration payload after deserialization.
#[derive(Debug, Clone)]
pub struct SignupInput {
    /// Legal name.
    pub full_name: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Password.
    pub password: String,
    /// Password repeated.
    pub confirm_password: String,
}

/// Service for registration, sign-in and credential management.
pub struct UserService<U: UserStore, N: Notifier> {
    users: Arc<U>,
    notifier: Arc<N>,
    signature_secret: String,
}

impl<U: UserStore, N: Notifier> UserService<U, N> {
    /// Create a new user service.
    #[must_use]
    pub fn new(users: Arc<U>, notifier: Arc<N>, signature_secret: impl Into<String>) -> Self {
        Self {
            users,
            notifier,
            signature_secret: signature_secret.into(),
        }
    }

    /// Load a user or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` for unknown ids.
    pub async fn get(&self, user_id: UserId) -> Result<UserAccount, UserError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UserError::not_found("User not found"))
    }

    /// Register a new customer and open their account.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` for malformed input or a taken
    /// username, email or phone.
    pub async fn signup(&self, input: SignupInput) -> Result<UserAccount, UserError> {
        let full_name = validation::full_name(&input.full_name)?;
        let username = validation::username(&input.username)?;
        let email = validation::email(&input.email)?;
        let phone = validation::phone(&input.phone)?;
        validation::password(&input.password, &input.confirm_password)?;

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(UserError::validation("Username already taken"));
        }
        for (kind, value) in [(ContactKind::Email, &email), (ContactKind::Phone, &phone)] {
            if self.users.find_contact_owner(kind, value).await?.is_some() {
                return Err(UserError::validation(format!(
                    "{} already registered",
                    kind.label()
                )));
            }
        }

        let account_number = self.allocate_account_number().await?;
        let password_hash = hash_secret(&input.password)?;

        let user = self
            .users
            .create(NewUser {
                username,
                full_name,
                email,
                phone,
                password_hash,
                account_number,
            })
            .await?;

        tracing::info!(user_id = %user.id, account_number = %user.account_number, "user registered");
        Ok(user)
    }

    async fn allocate_account_number(&self) -> Result<String, UserError> {
        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let candidate = generate_code(ACCOUNT_NUMBER_LENGTH);
            if candidate.starts_with('0') {
                continue;
            }
            if !self.users.account_number_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(UserError::repository("could not allocate a free account number"))
    }

    /// Authenticate with username and password.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Unauthorized` for an unknown user or wrong password.
    pub async fn signin(&self, username: &str, password: &str) -> Result<UserAccount, UserError> {
        let invalid = || UserError::Unauthorized("Invalid username or password".to_string());

        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_secret(password, &user.password_hash)? {
            return Err(invalid());
        }
        Ok(user)
    }

    /// Set the first transaction PIN.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` when a PIN exists already or the input
    /// is malformed.
    pub async fn set_pin(&self, user_id: UserId, pin: &str, confirm: &str) -> Result<(), UserError> {
        let mut user = self.get(user_id).await?;
        if user.has_pin() {
            return Err(UserError::validation("PIN already set"));
        }
        validation::new_pin(pin, confirm)?;

        user.pin_hash = Some(hash_secret(pin)?);
        self.users.save(&user).await
    }

    /// Re-authenticate with the password and return a change signature.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` for a wrong password.
    pub async fn verify_password(&self, user_id: UserId, password: &str) -> Result<String, UserError> {
        let user = self.get(user_id).await?;
        if !verify_secret(password, &user.password_hash)? {
            return Err(UserError::validation("Invalid password"));
        }
        Ok(sign_credential(
            &self.signature_secret,
            user.id.into_inner(),
            &user.password_hash,
        ))
    }

    /// Re-authenticate with the PIN and return a change signature.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` when no PIN is set or it does not match.
    pub async fn verify_pin(&self, user_id: UserId, pin: &str) -> Result<String, UserError> {
        let user = self.get(user_id).await?;
        user.check_pin(pin)?;
        let hash = user.pin_hash.as_deref().unwrap_or_default();
        Ok(sign_credential(&self.signature_secret, user.id.into_inner(), hash))
    }

    fn check_signature(
        &self,
        user: &UserAccount,
        credential_hash: &str,
        signature: Option<&str>,
    ) -> Result<(), UserError> {
        let presented = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| UserError::validation("Signature is required"))?;
        if verify_signature(
            &self.signature_secret,
            user.id.into_inner(),
            credential_hash,
            presented,
        ) {
            Ok(())
        } else {
            Err(UserError::validation("Invalid signature"))
        }
    }

    /// Replace the password after a successful `verify_password`.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` for a missing or stale signature, a
    /// mismatched confirmation, or reuse of the current password.
    pub async fn change_password(
        &self,
        user_id: UserId,
        signature: Option<&str>,
        password: &str,
        confirm: &str,
    ) -> Result<(), UserError> {
        let mut user = self.get(user_id).await?;
        self.check_signature(&user, &user.password_hash, signature)?;
        validation::password(password, confirm)?;
        if verify_secret(password, &user.password_hash)? {
            return Err(UserError::validation(
                "New password must be different from the old password",
            ));
        }

        user.password_hash = hash_secret(password)?;
        self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, "password changed");

        send_alert(
            self.notifier.as_ref(),
            &user,
            "Your password was changed",
            "The password of your Rupi account was just changed.",
        )
        .await;
        Ok(())
    }

    /// Replace the PIN after a successful `verify_pin`.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Validation` for a missing or stale signature, a
    /// malformed or mismatched PIN, or reuse of the current PIN.
    pub async fn change_pin(
        &self,
        user_id: UserId,
        signature: Option<&str>,
        pin: &str,
        confirm: &str,
    ) -> Result<(), UserError> {
        let mut user = self.get(user_id).await?;
        let current = user
            .pin_hash
            .clone()
            .ok_or_else(|| UserError::validation("PIN is not set"))?;
        self.check_signature(&user, &current, signature)?;
        validation::new_pin(pin, confirm)?;
        if verify_secret(pin, &current)? {
            return Err(UserError::validation(
                "New PIN must be different from the old PIN",
            ));
        }

        user.pin_hash = Some(hash_secret(pin)?);
        self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, "pin changed");

        send_alert(
            self.notifier.as_ref(),
            &user,
            "Your PIN was changed",
            "The transaction PIN of your Rupi account was just changed.",
        )
        .await;
        Ok(())
    }
}
