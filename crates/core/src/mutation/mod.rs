//! Account mutations: the transaction history of a customer account.
//!
//! Mutations are immutable. The core only reads them, apart from QRIS
//! payments which record a debit through [`crate::qris::PaymentLedger`].
//!
//! This module provides:
//! - Mutation types and their wire names
//! - The WIB (UTC+7) calendar used for ranges and rendering
//! - Listing filters and the monthly income/expense summary

mod error;
mod range;
mod service;
mod store;
mod summary;
mod types;

#[cfg(test)]
mod tests;

pub use error::MutationError;
pub use range::{MutationFilter, SummaryRange, WIB_OFFSET_SECS, wib, wib_date, wib_time_label};
pub use service::MutationService;
pub use store::MutationStore;
pub use summary::{CategorySummary, DirectionSummary, MutationSummary, summarize};
pub use types::{
    Mutation, MutationDetail, MutationType, Party, TransactionPurpose, TransactionType,
};
