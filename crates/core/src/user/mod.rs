//! User accounts and credentials.
//!
//! This module provides:
//! - The account record shared by every workflow
//! - Store and notifier seams implemented outside the core
//! - Input validation for contacts, passwords and PINs
//! - Registration, sign-in, PIN setup and signature-gated credential changes

mod error;
mod service;
mod store;
mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::UserError;
pub use service::{SignupInput, UserService};
pub use store::{Notification, Notifier, UserStore};
pub(crate) use store::send_alert;
pub use types::{ContactKind, DEFAULT_AVATAR, NewUser, UserAccount};
