//! QRIS payment service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rupi_shared::types::UserId;
use rust_decimal::Decimal;

use super::error::QrisError;
use super::payload::{CPM_VALIDITY_SECS, MerchantPayload, build_customer_payload};
use crate::mutation::{Mutation, TransactionPurpose};
use crate::user::{UserAccount, UserError, UserStore};

/// Most decimal places an amount may carry.
const AMOUNT_DP: u32 = 2;

/// A payment request from the account holder.
#[derive(Debug, Clone)]
pub struct QrisPayment {
    /// Merchant-presented payload as scanned.
    pub qris: String,
    /// Amount to pay.
    pub amount: Decimal,
    /// Transaction PIN.
    pub pin: String,
    /// Optional note.
    pub description: Option<String>,
    /// Purpose tag; defaults to `OTHER`.
    pub purpose: Option<TransactionPurpose>,
}

/// A checked debit handed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrisDebit {
    /// Payer.
    pub user_id: UserId,
    /// Amount to move.
    pub amount: Decimal,
    /// Merchant name.
    pub merchant_name: String,
    /// Merchant PAN or ID.
    pub merchant_account: Option<String>,
    /// Payer's note.
    pub description: Option<String>,
    /// Purpose tag.
    pub purpose: TransactionPurpose,
    /// Booking time.
    pub at: DateTime<Utc>,
}

/// A customer-presented payload and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerPayload {
    /// The payload string to render as a QR code.
    pub qris: String,
    /// After this instant merchants must reject it.
    pub expired_at: DateTime<Utc>,
}

/// Atomic balance debit plus mutation insert.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait PaymentLedger: Send + Sync {
    /// Lock the payer, re-check the balance, subtract the amount and record
    /// a `DEBIT`/`QRIS` mutation, all in one transaction.
    ///
    /// Returns `QrisError::InsufficientBalance` when the locked balance does
    /// not cover the amount.
    fn record_debit(
        &self,
        debit: QrisDebit,
    ) -> impl std::future::Future<Output = Result<Mutation, QrisError>> + Send;
}

/// Service for QRIS payload generation and payment.
pub struct QrisService<U: UserStore, P: PaymentLedger> {
    users: Arc<U>,
    ledger: Arc<P>,
}

impl<U: UserStore, P: PaymentLedger> QrisService<U, P> {
    /// Create a new QRIS service.
    #[must_use]
    pub fn new(users: Arc<U>, ledger: Arc<P>) -> Self {
        Self { users, ledger }
    }

    async fn authorize(&self, user_id: UserId, pin: &str) -> Result<UserAccount, QrisError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UserError::not_found("User not found"))?;
        user.check_pin(pin)?;
        Ok(user)
    }

    /// Generate a customer-presented payload, valid for five minutes.
    ///
    /// # Errors
    ///
    /// Returns `QrisError::User` for an unknown user or a wrong PIN.
    pub async fn generate_cpm(
        &self,
        user_id: UserId,
        pin: &str,
        now: DateTime<Utc>,
    ) -> Result<CustomerPayload, QrisError> {
        let user = self.authorize(user_id, pin).await?;
        let qris = build_customer_payload(&user, now)?;

        tracing::debug!(user_id = %user.id, "customer qris generated");
        Ok(CustomerPayload {
            qris,
            expired_at: now + Duration::seconds(CPM_VALIDITY_SECS),
        })
    }

    /// Pay a merchant-presented payload from the balance.
    ///
    /// # Errors
    ///
    /// Returns `QrisError::Checksum`/`Malformed` for a bad payload,
    /// `QrisError::Validation` for a bad amount, `QrisError::User` for a
    /// wrong PIN, and `QrisError::InsufficientBalance` when the balance is
    /// short.
    pub async fn pay(
        &self,
        user_id: UserId,
        payment: QrisPayment,
        now: DateTime<Utc>,
    ) -> Result<Mutation, QrisError> {
        let merchant = MerchantPayload::decode(&payment.qris)?;

        if payment.amount <= Decimal::ZERO {
            return Err(QrisError::validation("Amount must be greater than zero"));
        }
        if payment.amount.normalize().scale() > AMOUNT_DP {
            return Err(QrisError::validation(
                "Amount must have at most 2 decimal places",
            ));
        }
        if let Some(fixed) = merchant.amount
            && fixed != payment.amount
        {
            return Err(QrisError::validation(
                "Amount does not match the QRIS amount",
            ));
        }

        let user = self.authorize(user_id, &payment.pin).await?;
        if user.balance < payment.amount {
            return Err(QrisError::InsufficientBalance);
        }

        let mutation = self
            .ledger
            .record_debit(QrisDebit {
                user_id,
                amount: payment.amount,
                merchant_name: merchant.name,
                merchant_account: merchant.account,
                description: payment
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                purpose: payment.purpose.unwrap_or_default(),
                at: now,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            mutation_id = %mutation.id,
            amount = %mutation.amount,
            merchant = %mutation.counterparty_name,
            "qris payment booked"
        );
        Ok(mutation)
    }
}
