//! Response shapes shared by several route modules.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use rupi_core::mutation::{
    Mutation, MutationType, TransactionPurpose, TransactionType, wib_date, wib_time_label,
};
use rupi_core::user::UserAccount;
use rupi_shared::types::MutationId;

/// One mutation row as listed to the account holder.
#[derive(Debug, Serialize)]
pub struct MutationView {
    pub id: MutationId,
    pub date: NaiveDate,
    /// `HH:MM WIB`.
    pub time: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub mutation_type: MutationType,
    pub counterparty_name: String,
    pub counterparty_account: Option<String>,
    pub description: Option<String>,
    pub transaction_purpose: TransactionPurpose,
    pub created_at: DateTime<Utc>,
}

impl From<Mutation> for MutationView {
    fn from(m: Mutation) -> Self {
        Self {
            id: m.id,
            date: wib_date(m.created_at),
            time: wib_time_label(m.created_at),
            amount: m.amount,
            transaction_type: m.transaction_type,
            mutation_type: m.mutation_type,
            counterparty_name: m.counterparty_name,
            counterparty_account: m.counterparty_account,
            description: m.description,
            transaction_purpose: m.purpose,
            created_at: m.created_at,
        }
    }
}

/// The caller's profile.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: uuid::Uuid,
    pub username: String,
    pub full_name: String,
    pub alias: Option<String>,
    /// Alias when set, otherwise the full name.
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub is_verified: bool,
    pub has_pin: bool,
    pub account_number: String,
}

impl From<UserAccount> for ProfileView {
    fn from(user: UserAccount) -> Self {
        Self {
            id: user.id.into_inner(),
            name: user.display_name().to_string(),
            has_pin: user.has_pin(),
            username: user.username,
            full_name: user.full_name,
            alias: user.alias,
            email: user.email,
            phone: user.phone,
            avatar: user.avatar,
            is_verified: user.email_verified,
            account_number: user.account_number,
        }
    }
}
