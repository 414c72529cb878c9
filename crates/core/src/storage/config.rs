//! Storage configuration types.

use std::path::PathBuf;

use rupi_shared::config::StorageSettings;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, MinIO
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Avatar storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum avatar size in bytes.
    pub max_file_size: u64,
}

impl StorageConfig {
    /// Default max avatar size: 2MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}

impl TryFrom<&StorageSettings> for StorageConfig {
    type Error = StorageError;

    fn try_from(settings: &StorageSettings) -> Result<Self, Self::Error> {
        let provider = match settings.provider.as_str() {
            "local_fs" | "local" => StorageProvider::local_fs(&settings.root),
            "s3" => {
                let required = |value: &Option<String>, name: &str| {
                    value
                        .clone()
                        .ok_or_else(|| StorageError::configuration(format!("storage.{name} is required for s3")))
                };
                StorageProvider::S3 {
                    endpoint: required(&settings.endpoint, "endpoint")?,
                    bucket: required(&settings.bucket, "bucket")?,
                    access_key_id: required(&settings.access_key_id, "access_key_id")?,
                    secret_access_key: required(&settings.secret_access_key, "secret_access_key")?,
                    region: settings.region.clone().unwrap_or_else(|| "auto".to_string()),
                }
            }
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        Ok(Self::new(provider).with_max_file_size(settings.max_avatar_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_settings() {
        let config = StorageConfig::try_from(&StorageSettings::default()).unwrap();
        assert_eq!(config.provider.name(), "local");
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_s3_requires_bucket() {
        let settings = StorageSettings {
            provider: "s3".to_string(),
            endpoint: Some("https://account.r2.cloudflarestorage.com".to_string()),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..StorageSettings::default()
        };
        let err = StorageConfig::try_from(&settings).unwrap_err();
        assert!(err.to_string().contains("storage.bucket"));

        let settings = StorageSettings {
            bucket: Some("avatars".to_string()),
            ..settings
        };
        let config = StorageConfig::try_from(&settings).unwrap();
        assert_eq!(config.provider.name(), "s3");
    }

    #[test]
    fn test_unknown_provider() {
        let settings = StorageSettings {
            provider: "azure".to_string(),
            ..StorageSettings::default()
        };
        assert!(StorageConfig::try_from(&settings).is_err());
    }
}
