//! One-time code workflow.
//!
//! Each (user, purpose) pair holds at most one live code. A code is hashed at
//! rest, expires after the configured TTL and may only be re-issued once it is
//! older than `ttl - resend_lead`. Expiry is checked lazily at verification.
//!
//! ```text
//! NONE -> PENDING -> VERIFIED -> NONE
//!                 -> EXPIRED  -> NONE
//! ```

mod service;
mod types;


pub use service::{OtpService, OtpStore};
pub use types::{IssueOutcome, OtpPurpose, OtpRecord, mask_phone};
