//! Profile service implementation.

use std::sync::Arc;

use rupi_shared::types::UserId;

use crate::storage::{AvatarStorage, AvatarUpload};
use crate::user::{DEFAULT_AVATAR, UserAccount, UserError, UserStore};

/// Fields a profile update may carry.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name; blank values are ignored.
    pub name: Option<String>,
    /// New avatar image.
    pub avatar: Option<AvatarUpload>,
}

/// Service for the account holder's profile.
pub struct ProfileService<U: UserStore> {
    users: Arc<U>,
    storage: Arc<AvatarStorage>,
}

impl<U: UserStore> ProfileService<U> {
    /// Create a new profile service.
    #[must_use]
    pub fn new(users: Arc<U>, storage: Arc<AvatarStorage>) -> Self {
        Self { users, storage }
    }

    /// Load the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` for an unknown user.
    pub async fn get(&self, user_id: UserId) -> Result<UserAccount, UserError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UserError::not_found("User not found"))
    }

    /// Apply a profile update.
    ///
    /// The previous avatar is removed once the new one is stored, unless it
    /// is the shared default.
    ///
    /// # Errors
    ///
    /// Returns `UserError::Storage` when the avatar is rejected or cannot be
    /// written.
    pub async fn update(&self, user_id: UserId, update: ProfileUpdate) -> Result<UserAccount, UserError> {
        let mut user = self.get(user_id).await?;

        if let Some(name) = update.name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            user.alias = Some(name.to_string());
        }

        let mut replaced = None;
        if let Some(avatar) = update.avatar {
            let path = self.storage.store(avatar).await?;
            replaced = Some(std::mem::replace(&mut user.avatar, path));
        }

        if let Err(e) = self.users.save(&user).await {
            if replaced.is_some() {
                self.discard(&user.avatar).await;
            }
            return Err(e);
        }

        if let Some(previous) = replaced {
            self.discard(&previous).await;
        }

        tracing::info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    async fn discard(&self, path: &str) {
        if let Err(e) = self.storage.delete_public(path, DEFAULT_AVATAR).await {
            tracing::warn!(error = %e, path, "failed to delete avatar");
        }
    }
}
