//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// SMTP configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// WhatsApp gateway configuration.
    #[serde(default)]
    pub whatsapp: WhatsappConfig,
    /// OTP lifetime and resend policy.
    #[serde(default)]
    pub otp: OtpConfig,
    /// Avatar storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Credential-signature secret and lifetime.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604_800 // 7 days
}

/// SMTP configuration for transactional email.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "no-reply@rupi.local".to_string(),
            from_name: "Rupi".to_string(),
        }
    }
}

/// WhatsApp gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhatsappConfig {
    /// Base URL of the gateway API.
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// OTP lifetime and resend policy.
///
/// A code lives for `ttl_secs`. Re-issuance is suppressed until the code is
/// younger than `ttl_secs - resend_lead_secs`, i.e. a one minute cooldown with
/// the defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Code lifetime in seconds.
    pub ttl_secs: u64,
    /// Seconds before expiry during which a resend is refused.
    pub resend_lead_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            resend_lead_secs: 240,
        }
    }
}

/// Avatar storage configuration as read from config sources.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `local_fs` or `s3`.
    pub provider: String,
    /// Root directory for `local_fs`.
    pub root: String,
    /// S3 endpoint.
    pub endpoint: Option<String>,
    /// S3 bucket.
    pub bucket: Option<String>,
    /// S3 access key id.
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    pub secret_access_key: Option<String>,
    /// S3 region.
    pub region: Option<String>,
    /// Maximum avatar size in bytes.
    pub max_avatar_size: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: "local_fs".to_string(),
            root: "./uploads".to_string(),
            endpoint: None,
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            region: None,
            max_avatar_size: 2 * 1024 * 1024,
        }
    }
}

/// Secrets for credential-change signatures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Secret mixed into password/PIN change signatures.
    pub signature_secret: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            signature_secret: "change-me-in-production".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("RUPI").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUPI__DATABASE__URL", Some("postgres://localhost/rupi_test")),
                ("RUPI__JWT__SECRET", Some("env-secret")),
                ("RUN_MODE", Some("test-does-not-exist")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/rupi_test");
                assert_eq!(config.jwt.secret, "env-secret");
                assert_eq!(config.jwt.access_token_expiry_secs, 900);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.otp.ttl_secs, 300);
                assert_eq!(config.otp.resend_lead_secs, 240);
                assert_eq!(config.storage.provider, "local_fs");
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("RUPI__DATABASE__URL", None::<&str>),
                ("RUPI__JWT__SECRET", Some("env-secret")),
                ("RUN_MODE", Some("test-does-not-exist")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_section_defaults() {
        let email = EmailConfig::default();
        assert_eq!(email.smtp_host, "localhost");
        assert_eq!(email.smtp_port, 1025);

        let storage = StorageSettings::default();
        assert_eq!(storage.max_avatar_size, 2 * 1024 * 1024);
    }
}
