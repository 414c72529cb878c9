//! Avatar storage using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, MinIO
//! - Local filesystem (development, served by the api under `/uploads`)
//!
//! Objects are keyed `{uuid}.{ext}` and exposed to clients as
//! `uploads/{key}`, which is what the user record stores.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{AvatarStorage, AvatarUpload, PUBLIC_PREFIX};
