//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Extractors that answer malformed input with the envelope
//! - The `{message, data}` response envelope
//! - Notification dispatch over email and WhatsApp

pub mod error;
pub mod extract;
pub mod middleware;
pub mod notifier;
pub mod response;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use rupi_core::mutation::MutationService;
use rupi_core::otp::OtpService;
use rupi_core::profile::ProfileService;
use rupi_core::qris::QrisService;
use rupi_core::storage::{AvatarStorage, StorageConfig, StorageProvider};
use rupi_core::user::UserService;
use rupi_db::{MutationRepository, OtpRepository, UserRepository};
use rupi_shared::{AppConfig, AppError, EmailService, JwtConfig, JwtService, OtpConfig, WhatsappClient};

pub use error::ApiError;
pub use notifier::DispatchNotifier;

/// Upper bound for request bodies, avatar uploads included.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Registration, sign-in and credential changes.
    pub users: Arc<UserService<UserRepository, DispatchNotifier>>,
    /// One-time code lifecycle.
    pub otps: Arc<OtpService<UserRepository, OtpRepository, DispatchNotifier>>,
    /// Mutation history and summary.
    pub mutations: Arc<MutationService<MutationRepository>>,
    /// Profile reads and updates.
    pub profiles: Arc<ProfileService<UserRepository>>,
    /// QRIS generation and payment.
    pub qris: Arc<QrisService<UserRepository, MutationRepository>>,
    /// Directory served under `/uploads` for the local filesystem provider.
    pub uploads_dir: Option<PathBuf>,
}

impl AppState {
    /// Wire the services over one database connection.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        notifier: DispatchNotifier,
        storage: AvatarStorage,
        otp: OtpConfig,
        signature_secret: &str,
    ) -> Self {
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let otp_repo = Arc::new(OtpRepository::new(db.clone()));
        let mutation_repo = Arc::new(MutationRepository::new(db));
        let notifier = Arc::new(notifier);
        let storage = Arc::new(storage);

        Self {
            jwt_service: Arc::new(jwt_service),
            users: Arc::new(UserService::new(
                user_repo.clone(),
                notifier.clone(),
                signature_secret,
            )),
            otps: Arc::new(OtpService::new(
                user_repo.clone(),
                otp_repo,
                notifier,
                otp,
            )),
            mutations: Arc::new(MutationService::new(mutation_repo.clone())),
            profiles: Arc::new(ProfileService::new(user_repo.clone(), storage)),
            qris: Arc::new(QrisService::new(user_repo, mutation_repo)),
            uploads_dir: None,
        }
    }

    /// Build the state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` when the storage or WhatsApp settings are
    /// unusable.
    pub fn from_config(db: DatabaseConnection, config: &AppConfig) -> Result<Self, AppError> {
        let storage_config = StorageConfig::try_from(&config.storage)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let uploads_dir = match &storage_config.provider {
            StorageProvider::LocalFs { root } => Some(root.clone()),
            StorageProvider::S3 { .. } => None,
        };
        let storage = AvatarStorage::from_config(storage_config)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let whatsapp = WhatsappClient::new(&config.whatsapp)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let notifier = DispatchNotifier::new(EmailService::new(config.email.clone()), whatsapp);

        let mut state = Self::new(
            db,
            JwtService::new(JwtConfig::from(&config.jwt)),
            notifier,
            storage,
            config.otp,
            &config.security.signature_secret,
        );
        state.uploads_dir = uploads_dir;
        Ok(state)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().merge(routes::api_routes_with_state(state.clone()));
    if let Some(dir) = &state.uploads_dir {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
