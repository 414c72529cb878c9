//! Core business logic for Rupi.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence and delivery are reached through the store and notifier traits
//! declared here and implemented by the db and api crates.
//!
//! # Modules
//!
//! - `auth` - Argon2 hashing, one-time codes and credential-change signatures
//! - `user` - Accounts, registration, sign-in and credential changes
//! - `otp` - One-time code issue, resend and verification
//! - `profile` - Profile reads, alias and avatar updates
//! - `mutation` - Transaction history types, filters and the monthly summary
//! - `qris` - QRIS payload codec and merchant payments
//! - `storage` - Avatar object storage

pub mod auth;
pub mod mutation;
pub mod otp;
pub mod profile;
pub mod qris;
pub mod storage;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;
