//! Avatar storage service implementation using Apache OpenDAL.

use opendal::{Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Public path prefix under which stored avatars are served.
pub const PUBLIC_PREFIX: &str = "uploads/";

/// An avatar file received from a client.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    /// Original filename, if the client sent one.
    pub filename: Option<String>,
    /// Declared content type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Storage service for avatar images.
pub struct AvatarStorage {
    operator: Operator,
    config: StorageConfig,
}

impl AvatarStorage {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large or not an image.
    pub fn validate(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(StorageError::invalid_mime_type(content_type));
        }
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        Ok(())
    }

    /// Generate a fresh storage key: `{uuid}.{ext}`.
    ///
    /// The extension comes from the filename when it has a sane one,
    /// otherwise from the MIME subtype.
    #[must_use]
    pub fn generate_key(filename: Option<&str>, content_type: &str) -> String {
        let from_name = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.len() <= 5);
        let ext = from_name.map_or_else(|| extension_for(content_type), sanitize_extension);
        format!("{}.{ext}", Uuid::new_v4())
    }

    /// Validate and store an avatar; returns its public path
    /// (`uploads/{key}`).
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the write fails.
    pub async fn store(&self, upload: AvatarUpload) -> Result<String, StorageError> {
        let size = u64::try_from(upload.bytes.len()).unwrap_or(u64::MAX);
        self.validate(&upload.content_type, size)?;

        let key = Self::generate_key(upload.filename.as_deref(), &upload.content_type);
        self.operator
            .write(&key, upload.bytes)
            .await
            .map_err(StorageError::from)?;

        tracing::debug!(key = %key, size, provider = self.provider_name(), "avatar stored");
        Ok(format!("{PUBLIC_PREFIX}{key}"))
    }

    /// Delete an avatar by its public path.
    ///
    /// Paths outside `uploads/` and the shared default avatar are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete_public(&self, public_path: &str, default_path: &str) -> Result<(), StorageError> {
        if public_path == default_path {
            return Ok(());
        }
        let Some(key) = public_path.strip_prefix(PUBLIC_PREFIX) else {
            return Ok(());
        };
        if key.is_empty() || key.contains("..") {
            return Ok(());
        }
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}

fn sanitize_extension(ext: &str) -> String {
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() { "bin".to_string() } else { ext }
}

fn extension_for(content_type: &str) -> String {
    let subtype = content_type
        .split(';')
        .next()
        .and_then(|t| t.split_once('/'))
        .map_or("", |(_, sub)| sub.trim());
    match subtype {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        other => sanitize_extension(other),
    }
}
