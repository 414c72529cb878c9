//! In-memory stores and a recording notifier for service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rupi_shared::types::{MutationId, PageRequest, UserId};

use crate::auth::hash_secret;
use crate::mutation::{
    Mutation, MutationError, MutationFilter, MutationStore, MutationType, TransactionPurpose,
    TransactionType,
};
use crate::otp::{OtpPurpose, OtpRecord, OtpStore};
use crate::qris::{PaymentLedger, QrisDebit, QrisError};
use crate::user::{
    ContactKind, DEFAULT_AVATAR, NewUser, Notification, Notifier, UserAccount, UserError,
    UserStore,
};

/// Password every fixture user is created with.
pub const PASSWORD: &str = "rahasia123";
/// PIN every fixture user with a PIN is created with.
pub const PIN: &str = "123456";

/// Builds a verified user with a password and PIN.
pub fn user(username: &str) -> UserAccount {
    UserAccount {
        id: UserId::new(),
        username: username.to_string(),
        full_name: format!("{username} Santoso"),
        alias: None,
        email: format!("{username}@example.com"),
        phone: "081234567890".to_string(),
        password_hash: hash_secret(PASSWORD).expect("hash"),
        pin_hash: Some(hash_secret(PIN).expect("hash")),
        avatar: DEFAULT_AVATAR.to_string(),
        email_verified: true,
        account_number: "1234567890".to_string(),
        balance: Decimal::new(100_000, 0),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    pub rows: Mutex<HashMap<UserId, UserAccount>>,
}

impl MemoryUsers {
    pub fn with(users: impl IntoIterator<Item = UserAccount>) -> Self {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().unwrap();
            for u in users {
                rows.insert(u.id, u);
            }
        }
        store
    }

    pub fn get(&self, id: UserId) -> UserAccount {
        self.rows.lock().unwrap()[&id].clone()
    }
}

impl UserStore for MemoryUsers {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, UserError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_contact_owner(
        &self,
        kind: ContactKind,
        value: &str,
    ) -> Result<Option<UserId>, UserError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.contact(kind) == value)
            .map(|u| u.id))
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool, UserError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .any(|u| u.account_number == account_number))
    }

    async fn create(&self, input: NewUser) -> Result<UserAccount, UserError> {
        let user = UserAccount {
            id: UserId::new(),
            username: input.username,
            full_name: input.full_name,
            alias: None,
            email: input.email,
            phone: input.phone,
            password_hash: input.password_hash,
            pin_hash: None,
            avatar: DEFAULT_AVATAR.to_string(),
            email_verified: false,
            account_number: input.account_number,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &UserAccount) -> Result<(), UserError> {
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOtps {
    pub rows: Mutex<HashMap<(UserId, OtpPurpose), OtpRecord>>,
}

impl MemoryOtps {
    pub fn get(&self, user_id: UserId, purpose: OtpPurpose) -> Option<OtpRecord> {
        self.rows.lock().unwrap().get(&(user_id, purpose)).cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl OtpStore for MemoryOtps {
    async fn find(
        &self,
        user_id: UserId,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, UserError> {
        Ok(self.get(user_id, purpose))
    }

    async fn replace(&self, record: OtpRecord) -> Result<(), UserError> {
        self.rows
            .lock()
            .unwrap()
            .insert((record.user_id, record.purpose), record);
        Ok(())
    }

    async fn delete(&self, user_id: UserId, purpose: OtpPurpose) -> Result<(), UserError> {
        self.rows.lock().unwrap().remove(&(user_id, purpose));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
    /// Phone numbers the gateway refuses.
    pub invalid_phones: Vec<String>,
    /// Whether the number check itself fails.
    pub check_unreachable: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// The plaintext code of the most recent code notification.
    pub fn last_code(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|n| match n {
            Notification::EmailCode { code, .. } | Notification::WhatsappCode { code, .. } => {
                Some(code)
            }
            Notification::Alert { .. } => None,
        })
    }

    pub fn alerts(&self) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| matches!(n, Notification::Alert { .. }))
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), UserError> {
        if self.fail {
            return Err(UserError::notification("gateway down"));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }

    async fn check_phone(&self, phone: &str) -> Result<bool, UserError> {
        if self.check_unreachable {
            return Err(UserError::notification("gateway down"));
        }
        Ok(!self.invalid_phones.iter().any(|p| p == phone))
    }
}

/// Builds a mutation with a generated id.
pub fn mutation(
    user_id: UserId,
    amount: i64,
    transaction_type: TransactionType,
    mutation_type: MutationType,
    created_at: DateTime<Utc>,
) -> Mutation {
    Mutation {
        id: MutationId::new(),
        user_id,
        amount: Decimal::new(amount, 0),
        transaction_type,
        mutation_type,
        counterparty_name: "Warung Bu Sri".to_string(),
        counterparty_account: Some("9360001234".to_string()),
        description: None,
        purpose: TransactionPurpose::Other,
        created_at,
    }
}

#[derive(Default)]
pub struct MemoryMutations {
    pub rows: Mutex<Vec<Mutation>>,
}

impl MemoryMutations {
    pub fn with(mutations: impl IntoIterator<Item = Mutation>) -> Self {
        Self {
            rows: Mutex::new(mutations.into_iter().collect()),
        }
    }

    pub fn all(&self) -> Vec<Mutation> {
        self.rows.lock().unwrap().clone()
    }
}

impl MutationStore for MemoryMutations {
    async fn list_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Mutation>, MutationError> {
        let mut rows: Vec<_> = self
            .all()
            .into_iter()
            .filter(|m| m.user_id == user_id && start <= m.created_at && m.created_at <= end)
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn page(
        &self,
        user_id: UserId,
        filter: &MutationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Mutation>, u64), MutationError> {
        let mut rows: Vec<_> = self
            .all()
            .into_iter()
            .filter(|m| m.user_id == user_id && filter.matches(m))
            .collect();
        rows.sort_by_key(|m| std::cmp::Reverse(m.created_at));
        let total = rows.len() as u64;
        let content = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((content, total))
    }

    async fn find(&self, user_id: UserId, id: MutationId) -> Result<Option<Mutation>, MutationError> {
        Ok(self
            .all()
            .into_iter()
            .find(|m| m.id == id && m.user_id == user_id))
    }
}

/// Ledger over the in-memory users and mutations.
pub struct MemoryLedger {
    pub users: Arc<MemoryUsers>,
    pub mutations: Arc<MemoryMutations>,
}

impl PaymentLedger for MemoryLedger {
    async fn record_debit(&self, debit: QrisDebit) -> Result<Mutation, QrisError> {
        let mut rows = self.users.rows.lock().unwrap();
        let user = rows
            .get_mut(&debit.user_id)
            .ok_or_else(|| QrisError::repository("payer vanished"))?;
        if user.balance < debit.amount {
            return Err(QrisError::InsufficientBalance);
        }
        user.balance -= debit.amount;

        let mutation = Mutation {
            id: MutationId::new(),
            user_id: debit.user_id,
            amount: debit.amount,
            transaction_type: TransactionType::Debit,
            mutation_type: MutationType::Qris,
            counterparty_name: debit.merchant_name,
            counterparty_account: debit.merchant_account,
            description: debit.description,
            purpose: debit.purpose,
            created_at: debit.at,
        };
        self.mutations.rows.lock().unwrap().push(mutation.clone());
        Ok(mutation)
    }
}
