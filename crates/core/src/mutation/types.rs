//! Mutation data types.

use chrono::{DateTime, Utc};
use rupi_shared::types::{MutationId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::user::UserAccount;

/// Direction of money relative to the account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money in.
    Credit,
    /// Money out.
    Debit,
}

impl TransactionType {
    /// Wire and column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
        }
    }

    /// Parse a wire name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREDIT" => Some(Self::Credit),
            "DEBIT" => Some(Self::Debit),
            _ => None,
        }
    }
}

/// Channel a mutation went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationType {
    /// QRIS payment.
    Qris,
    /// Bank transfer.
    Transfer,
}

impl MutationType {
    /// Wire and column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qris => "QRIS",
            Self::Transfer => "TRANSFER",
        }
    }

    /// Parse a wire name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "QRIS" => Some(Self::Qris),
            "TRANSFER" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// Purpose tag picked by the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionPurpose {
    /// Buying goods or services.
    Purchase,
    /// Moving money into an investment.
    Investment,
    /// Plain transfer.
    Transfer,
    /// Anything else.
    #[default]
    Other,
}

impl TransactionPurpose {
    /// Wire and column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Investment => "INVESTMENT",
            Self::Transfer => "TRANSFER",
            Self::Other => "OTHER",
        }
    }

    /// Parse a wire name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PURCHASE" => Some(Self::Purchase),
            "INVESTMENT" => Some(Self::Investment),
            "TRANSFER" => Some(Self::Transfer),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A recorded credit or debit on a customer account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Mutation ID.
    pub id: MutationId,
    /// Account holder.
    pub user_id: UserId,
    /// Positive amount.
    pub amount: Decimal,
    /// Money in or out.
    pub transaction_type: TransactionType,
    /// Channel.
    pub mutation_type: MutationType,
    /// Other party's name (merchant name for QRIS).
    pub counterparty_name: String,
    /// Other party's account number, when known.
    pub counterparty_account: Option<String>,
    /// Free-text note.
    pub description: Option<String>,
    /// Purpose tag.
    pub purpose: TransactionPurpose,
    /// When the mutation was booked.
    pub created_at: DateTime<Utc>,
}

/// One side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    /// Display name.
    pub name: String,
    /// Account number, when known.
    pub account_number: Option<String>,
}

/// Mutation detail as shown to the account holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationDetail {
    /// A QRIS payment, shown from the merchant's side.
    Merchant {
        /// The mutation.
        mutation: Mutation,
        /// Merchant name.
        merchant: String,
        /// Merchant account or PAN.
        merchant_account: Option<String>,
    },
    /// A transfer, shown as sender and receiver.
    Transfer {
        /// The mutation.
        mutation: Mutation,
        /// Money came from here.
        sender: Party,
        /// Money went here.
        receiver: Party,
    },
}

impl MutationDetail {
    /// Build the detail view of `mutation` for its owner.
    #[must_use]
    pub fn new(mutation: Mutation, owner: &UserAccount) -> Self {
        if mutation.mutation_type == MutationType::Qris {
            return Self::Merchant {
                merchant: mutation.counterparty_name.clone(),
                merchant_account: mutation.counterparty_account.clone(),
                mutation,
            };
        }

        let me = Party {
            name: owner.full_name.clone(),
            account_number: Some(owner.account_number.clone()),
        };
        let them = Party {
            name: mutation.counterparty_name.clone(),
            account_number: mutation.counterparty_account.clone(),
        };
        let (sender, receiver) = match mutation.transaction_type {
            TransactionType::Debit => (me, them),
            TransactionType::Credit => (them, me),
        };
        Self::Transfer {
            mutation,
            sender,
            receiver,
        }
    }

    /// The underlying mutation.
    #[must_use]
    pub fn mutation(&self) -> &Mutation {
        match self {
            Self::Merchant { mutation, .. } | Self::Transfer { mutation, .. } => mutation,
        }
    }
}
