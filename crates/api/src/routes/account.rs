//! Account routes: account detail, mutation history and monthly summary.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::views::MutationView;
use crate::extract::Query;
use crate::{AppState, error::ApiError, middleware::AuthUser, response::ApiResponse};
use rupi_core::mutation::{
    CategorySummary, DirectionSummary, Mutation, MutationDetail, MutationError, MutationFilter,
    MutationSummary, MutationType, Party, TransactionPurpose, TransactionType, wib,
};
use rupi_shared::types::{MutationId, PageRequest, PageResponse, UserId};

/// Creates the account router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(get_account))
        .route("/account/mutations", get(list_mutations))
        .route("/account/mutations/{id}", get(get_mutation))
        .route("/account/summary", get(get_summary))
}

#[derive(Debug, Serialize)]
struct AccountView {
    user_id: UserId,
    account_number: String,
    full_name: String,
    email: String,
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct MutationQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    category: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
}

impl MutationQuery {
    fn into_parts(self) -> Result<(MutationFilter, PageRequest), ApiError> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(TransactionType::parse(raw).ok_or_else(|| {
                ApiError::validation("category must be either CREDIT or DEBIT")
            })?),
        };

        let defaults = PageRequest::default();
        let page = PageRequest {
            page: self.page.unwrap_or(defaults.page),
            size: self.size.unwrap_or(defaults.size),
        };

        let filter = MutationFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            category,
            search: self.search,
        };
        Ok((filter, page))
    }
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// Renders a decimal percentage as a JSON number.
fn as_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// A mutation inside a summary category.
#[derive(Debug, Serialize)]
struct SummaryMutationView {
    mutation_id: MutationId,
    account_number: Option<String>,
    full_name: String,
    amount: Decimal,
    description: Option<String>,
    transaction_purpose: TransactionPurpose,
    /// Local WIB time.
    created_at: NaiveDateTime,
}

impl From<Mutation> for SummaryMutationView {
    fn from(m: Mutation) -> Self {
        Self {
            mutation_id: m.id,
            account_number: m.counterparty_account,
            full_name: m.counterparty_name,
            amount: m.amount,
            description: m.description,
            transaction_purpose: m.purpose,
            created_at: m.created_at.with_timezone(&wib()).naive_local(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CategoryView {
    mutations: Vec<SummaryMutationView>,
    #[serde(rename = "type")]
    mutation_type: MutationType,
    number_of_transactions: usize,
    total_balance: Decimal,
    total_balance_percentage: f64,
}

impl From<CategorySummary> for CategoryView {
    fn from(c: CategorySummary) -> Self {
        Self {
            mutations: c.mutations.into_iter().map(Into::into).collect(),
            mutation_type: c.mutation_type,
            number_of_transactions: c.number_of_transactions,
            total_balance: c.total,
            total_balance_percentage: as_number(c.percentage),
        }
    }
}

fn categories(direction: Vec<CategorySummary>) -> Vec<CategoryView> {
    direction.into_iter().map(CategoryView::from).collect()
}

#[derive(Debug, Serialize)]
struct IncomeView {
    categories: Vec<CategoryView>,
    total_income: Decimal,
    total_income_percentage: f64,
}

impl From<DirectionSummary> for IncomeView {
    fn from(d: DirectionSummary) -> Self {
        Self {
            total_income: d.total,
            total_income_percentage: as_number(d.percentage),
            categories: categories(d.categories),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExpenseView {
    categories: Vec<CategoryView>,
    total_expense: Decimal,
    total_expense_percentage: f64,
}

impl From<DirectionSummary> for ExpenseView {
    fn from(d: DirectionSummary) -> Self {
        Self {
            total_expense: d.total,
            total_expense_percentage: as_number(d.percentage),
            categories: categories(d.categories),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryView {
    income: IncomeView,
    expense: ExpenseView,
    total_earnings: Decimal,
    range_start_mutation_date: NaiveDateTime,
    range_end_mutation_date: NaiveDateTime,
}

impl From<MutationSummary> for SummaryView {
    fn from(s: MutationSummary) -> Self {
        Self {
            range_start_mutation_date: s.range.start_local(),
            range_end_mutation_date: s.range.end_local(),
            total_earnings: s.total_earnings,
            income: s.income.into(),
            expense: s.expense.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PartyView {
    name: String,
    account_number: Option<String>,
}

impl From<Party> for PartyView {
    fn from(p: Party) -> Self {
        Self {
            name: p.name,
            account_number: p.account_number,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
enum DetailView {
    Merchant {
        #[serde(flatten)]
        mutation: MutationView,
        merchant: String,
        merchant_account: Option<String>,
    },
    Transfer {
        #[serde(flatten)]
        mutation: MutationView,
        sender: PartyView,
        receiver: PartyView,
    },
}

impl From<MutationDetail> for DetailView {
    fn from(detail: MutationDetail) -> Self {
        match detail {
            MutationDetail::Merchant {
                mutation,
                merchant,
                merchant_account,
            } => Self::Merchant {
                mutation: mutation.into(),
                merchant,
                merchant_account,
            },
            MutationDetail::Transfer {
                mutation,
                sender,
                receiver,
            } => Self::Transfer {
                mutation: mutation.into(),
                sender: sender.into(),
                receiver: receiver.into(),
            },
        }
    }
}

/// GET /account
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<AccountView>, ApiError> {
    let user = state.users.get(auth.user_id()).await?;
    Ok(ApiResponse::ok(
        "Account retrieved",
        AccountView {
            user_id: user.id,
            account_number: user.account_number,
            full_name: user.full_name,
            email: user.email,
            balance: user.balance,
        },
    ))
}

/// GET /account/mutations
async fn list_mutations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MutationQuery>,
) -> Result<ApiResponse<PageResponse<MutationView>>, ApiError> {
    let (filter, page) = query.into_parts()?;
    let result = state.mutations.list(auth.user_id(), &filter, page).await?;

    Ok(ApiResponse::ok(
        "Mutations retrieved",
        result.map(MutationView::from),
    ))
}

/// GET /account/mutations/{id}
async fn get_mutation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<DetailView>, ApiError> {
    let id: MutationId = id.parse().map_err(|_| MutationError::NotFound)?;
    let mutation = state.mutations.get(auth.user_id(), id).await?;
    let owner = state.users.get(auth.user_id()).await?;

    let detail = MutationDetail::new(mutation, &owner);
    Ok(ApiResponse::ok("Mutation retrieved", detail.into()))
}

/// GET /account/summary
async fn get_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<ApiResponse<SummaryView>, ApiError> {
    let summary = state
        .mutations
        .summary(auth.user_id(), query.year, query.month, Utc::now())
        .await?;
    Ok(ApiResponse::ok(
        "Account Mutations Summary fetched",
        summary.into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rupi_core::mutation::{SummaryRange, summarize};
    use rupi_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn debit(amount: Decimal, mutation_type: MutationType, minute: u32) -> Mutation {
        Mutation {
            id: MutationId::new(),
            user_id: UserId::new(),
            amount,
            transaction_type: TransactionType::Debit,
            mutation_type,
            counterparty_name: "Samsul".to_string(),
            counterparty_account: Some("7484357077".to_string()),
            description: None,
            purpose: TransactionPurpose::Investment,
            created_at: Utc.with_ymd_and_hms(2024, 7, 29, 13, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_summary_json_shape() {
        let now = Utc.with_ymd_and_hms(2024, 7, 29, 16, 0, 0).unwrap();
        let range = SummaryRange::resolve(Some(2024), Some(7), now).unwrap();
        let summary = summarize(
            vec![
                debit(dec!(10000), MutationType::Qris, 21),
                debit(dec!(15000), MutationType::Transfer, 30),
            ],
            range,
        );

        let json = serde_json::to_value(SummaryView::from(summary)).unwrap();

        assert_eq!(json["income"]["categories"], serde_json::json!([]));
        assert_eq!(json["income"]["total_income"], "0");
        assert_eq!(json["income"]["total_income_percentage"], 0.0);
        assert_eq!(json["expense"]["total_expense"], "25000");
        assert_eq!(json["expense"]["total_expense_percentage"], 100.0);
        assert_eq!(json["total_earnings"], "-25000");
        assert_eq!(json["range_start_mutation_date"], "2024-07-01T00:00:00");
        assert_eq!(
            json["range_end_mutation_date"],
            "2024-07-31T23:59:59.999999999"
        );

        let qris = &json["expense"]["categories"][0];
        assert_eq!(qris["type"], "QRIS");
        assert_eq!(qris["number_of_transactions"], 1);
        assert_eq!(qris["total_balance"], "10000");
        assert_eq!(qris["total_balance_percentage"], 40.0);
        assert_eq!(qris["mutations"][0]["full_name"], "Samsul");
        assert_eq!(qris["mutations"][0]["created_at"], "2024-07-29T20:21:00");

        let transfer = &json["expense"]["categories"][1];
        assert_eq!(transfer["type"], "TRANSFER");
        assert_eq!(transfer["total_balance"], "15000");
        assert_eq!(transfer["total_balance_percentage"], 60.0);
    }
}
