//! Shared types, errors, and configuration for Rupi.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT handling and auth payloads
//! - Outbound notification clients (SMTP email, WhatsApp gateway)

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;
pub mod whatsapp;

pub use auth::{Claims, TokenPair, TokenType};
pub use config::{AppConfig, EmailConfig, OtpConfig, WhatsappConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use whatsapp::{WhatsappClient, WhatsappError};
