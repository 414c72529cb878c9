//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories backing the core store traits
//! - Database migrations

// Column, Entity and ActiveModel items come from the SeaORM derives.
#[allow(missing_docs)]
pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{MutationRepository, OtpRepository, UserRepository};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
