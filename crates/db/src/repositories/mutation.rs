//! Mutation repository for database operations.
//!
//! Reads back a user's history and books balance-changing mutations. Every
//! booking locks the account row, so concurrent debits serialize on it.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::sea_orm_active_enums::{
    MutationType as DbMutationType, TransactionPurpose as DbTransactionPurpose,
    TransactionType as DbTransactionType,
};
use crate::entities::{mutations, users};
use rupi_core::mutation::{
    Mutation, MutationError, MutationFilter, MutationStore as MutationStoreTrait, MutationType,
    TransactionPurpose, TransactionType,
};
use rupi_core::qris::{PaymentLedger, QrisDebit, QrisError};
use rupi_shared::types::{MutationId, PageRequest, UserId};

/// Mutation repository implementation.
#[derive(Debug, Clone)]
pub struct MutationRepository {
    db: DatabaseConnection,
}

/// Why a booking did not happen.
enum BookingError {
    UnknownAccount,
    InsufficientBalance,
    Db(DbErr),
}

impl From<DbErr> for BookingError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

impl MutationRepository {
    /// Creates a new mutation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Book a mutation and apply it to the account balance.
    ///
    /// Used for mutations that arrive from the transfer network and for
    /// seeding.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing, a debit would overdraw
    /// it, or the database operation fails.
    pub async fn record(&self, mutation: &Mutation) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;
        match Self::book(&txn, mutation).await {
            Ok(()) => txn.commit().await,
            Err(BookingError::Db(e)) => Err(e),
            Err(BookingError::UnknownAccount) => {
                Err(DbErr::RecordNotFound(format!("user {}", mutation.user_id)))
            }
            Err(BookingError::InsufficientBalance) => Err(DbErr::Custom(format!(
                "insufficient balance for mutation {}",
                mutation.id
            ))),
        }
    }

    /// Lock the account, apply the delta and insert the mutation row.
    async fn book(txn: &DatabaseTransaction, mutation: &Mutation) -> Result<(), BookingError> {
        let account = users::Entity::find_by_id(mutation.user_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(BookingError::UnknownAccount)?;

        let balance = match mutation.transaction_type {
            TransactionType::Credit => account.balance + mutation.amount,
            TransactionType::Debit if account.balance < mutation.amount => {
                return Err(BookingError::InsufficientBalance);
            }
            TransactionType::Debit => account.balance - mutation.amount,
        };

        users::ActiveModel {
            id: Set(account.id),
            balance: Set(balance),
            ..Default::default()
        }
        .update(txn)
        .await?;

        to_active_model(mutation).insert(txn).await?;
        Ok(())
    }
}

fn repo_error(err: DbErr) -> MutationError {
    MutationError::repository(err.to_string())
}

/// Escape `LIKE` wildcards in user input.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl MutationStoreTrait for MutationRepository {
    async fn list_in_range(
        &self,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Mutation>, MutationError> {
        let models = mutations::Entity::find()
            .filter(mutations::Column::UserId.eq(user_id.into_inner()))
            .filter(mutations::Column::CreatedAt.gte(start))
            .filter(mutations::Column::CreatedAt.lte(end))
            .order_by_asc(mutations::Column::CreatedAt)
            .order_by_asc(mutations::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn page(
        &self,
        user_id: UserId,
        filter: &MutationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Mutation>, u64), MutationError> {
        let mut query =
            mutations::Entity::find().filter(mutations::Column::UserId.eq(user_id.into_inner()));

        if let Some(from) = filter.from_instant() {
            query = query.filter(mutations::Column::CreatedAt.gte(from));
        }
        if let Some(until) = filter.until_instant() {
            query = query.filter(mutations::Column::CreatedAt.lt(until));
        }
        if let Some(category) = filter.category {
            query = query.filter(mutations::Column::TransactionType.eq(to_db_type(category)));
        }
        if let Some(term) = filter.search_term() {
            let pattern = like_pattern(term);
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(mutations::Column::CounterpartyName)))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(mutations::Column::Description)))
                            .like(pattern),
                    ),
            );
        }

        let paginator = query
            .order_by_desc(mutations::Column::CreatedAt)
            .order_by_desc(mutations::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await.map_err(repo_error)?;
        let models = paginator
            .fetch_page(u64::from(page.page))
            .await
            .map_err(repo_error)?;

        Ok((models.into_iter().map(to_domain).collect(), total))
    }

    async fn find(&self, user_id: UserId, id: MutationId) -> Result<Option<Mutation>, MutationError> {
        let model = mutations::Entity::find_by_id(id.into_inner())
            .filter(mutations::Column::UserId.eq(user_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(model.map(to_domain))
    }
}

impl PaymentLedger for MutationRepository {
    async fn record_debit(&self, debit: QrisDebit) -> Result<Mutation, QrisError> {
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

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| QrisError::repository(e.to_string()))?;
        match Self::book(&txn, &mutation).await {
            Ok(()) => {}
            Err(BookingError::InsufficientBalance) => return Err(QrisError::InsufficientBalance),
            Err(BookingError::UnknownAccount) => {
                return Err(QrisError::repository("payer account not found"));
            }
            Err(BookingError::Db(e)) => return Err(QrisError::repository(e.to_string())),
        }
        txn.commit()
            .await
            .map_err(|e| QrisError::repository(e.to_string()))?;

        Ok(mutation)
    }
}

fn to_db_type(t: TransactionType) -> DbTransactionType {
    match t {
        TransactionType::Credit => DbTransactionType::Credit,
        TransactionType::Debit => DbTransactionType::Debit,
    }
}

fn to_db_purpose(p: TransactionPurpose) -> DbTransactionPurpose {
    match p {
        TransactionPurpose::Purchase => DbTransactionPurpose::Purchase,
        TransactionPurpose::Investment => DbTransactionPurpose::Investment,
        TransactionPurpose::Transfer => DbTransactionPurpose::Transfer,
        TransactionPurpose::Other => DbTransactionPurpose::Other,
    }
}

fn to_active_model(m: &Mutation) -> mutations::ActiveModel {
    mutations::ActiveModel {
        id: Set(m.id.into_inner()),
        user_id: Set(m.user_id.into_inner()),
        amount: Set(m.amount),
        transaction_type: Set(to_db_type(m.transaction_type)),
        mutation_type: Set(match m.mutation_type {
            MutationType::Qris => DbMutationType::Qris,
            MutationType::Transfer => DbMutationType::Transfer,
        }),
        counterparty_name: Set(m.counterparty_name.clone()),
        counterparty_account: Set(m.counterparty_account.clone()),
        description: Set(m.description.clone()),
        transaction_purpose: Set(to_db_purpose(m.purpose)),
        created_at: Set(m.created_at.into()),
    }
}

fn to_domain(model: mutations::Model) -> Mutation {
    Mutation {
        id: MutationId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        amount: model.amount,
        transaction_type: match model.transaction_type {
            DbTransactionType::Credit => TransactionType::Credit,
            DbTransactionType::Debit => TransactionType::Debit,
        },
        mutation_type: match model.mutation_type {
            DbMutationType::Qris => MutationType::Qris,
            DbMutationType::Transfer => MutationType::Transfer,
        },
        counterparty_name: model.counterparty_name,
        counterparty_account: model.counterparty_account,
        description: model.description,
        purpose: match model.transaction_purpose {
            DbTransactionPurpose::Purchase => TransactionPurpose::Purchase,
            DbTransactionPurpose::Investment => TransactionPurpose::Investment,
            DbTransactionPurpose::Transfer => TransactionPurpose::Transfer,
            DbTransactionPurpose::Other => TransactionPurpose::Other,
        },
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case("kopi", "%kopi%")]
    #[case("50%_off", "%50\\%\\_off%")]
    #[case("Bu SRI", "%bu sri%")]
    #[case("a\\b", "%a\\\\b%")]
    fn test_like_pattern(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }

    #[test]
    fn test_row_conversion_round_trips() {
        let mutation = Mutation {
            id: MutationId::new(),
            user_id: UserId::new(),
            amount: dec!(15000.50),
            transaction_type: TransactionType::Debit,
            mutation_type: MutationType::Qris,
            counterparty_name: "Warung Bu Sri".to_string(),
            counterparty_account: None,
            description: Some("kopi".to_string()),
            purpose: TransactionPurpose::Purchase,
            created_at: Utc.with_ymd_and_hms(2024, 7, 29, 13, 30, 0).unwrap(),
        };

        let active = to_active_model(&mutation);
        let model = mutations::Model {
            id: active.id.unwrap(),
            user_id: active.user_id.unwrap(),
            amount: active.amount.unwrap(),
            transaction_type: active.transaction_type.unwrap(),
            mutation_type: active.mutation_type.unwrap(),
            counterparty_name: active.counterparty_name.unwrap(),
            counterparty_account: active.counterparty_account.unwrap(),
            description: active.description.unwrap(),
            transaction_purpose: active.transaction_purpose.unwrap(),
            created_at: active.created_at.unwrap(),
        };
        assert_eq!(to_domain(model), mutation);
    }
}
