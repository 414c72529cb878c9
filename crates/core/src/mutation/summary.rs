//! Monthly income/expense summary grouped by channel.

use rust_decimal::{Decimal, RoundingStrategy};

use super::range::SummaryRange;
use super::types::{Mutation, MutationType, TransactionType};

/// Decimal places kept on percentages.
const PERCENTAGE_DP: u32 = 2;

/// Mutations of one channel within one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    /// Channel.
    pub mutation_type: MutationType,
    /// The mutations, oldest first.
    pub mutations: Vec<Mutation>,
    /// Number of mutations.
    pub number_of_transactions: usize,
    /// Sum of amounts.
    pub total: Decimal,
    /// Share of the direction total, in percent.
    pub percentage: Decimal,
}

/// All income or all expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionSummary {
    /// Per-channel groups in first-seen order.
    pub categories: Vec<CategorySummary>,
    /// Sum over all groups.
    pub total: Decimal,
    /// Share of income plus expense, in percent.
    pub percentage: Decimal,
}

/// Result of [`summarize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSummary {
    /// Credits.
    pub income: DirectionSummary,
    /// Debits.
    pub expense: DirectionSummary,
    /// Income minus expense.
    pub total_earnings: Decimal,
    /// Covered range.
    pub range: SummaryRange,
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(PERCENTAGE_DP, RoundingStrategy::MidpointAwayFromZero)
}

fn group(mutations: Vec<Mutation>) -> (Vec<CategorySummary>, Decimal) {
    let mut categories: Vec<CategorySummary> = Vec::new();
    for mutation in mutations {
        let amount = mutation.amount;
        match categories
            .iter_mut()
            .find(|c| c.mutation_type == mutation.mutation_type)
        {
            Some(category) => {
                category.total += amount;
                category.number_of_transactions += 1;
                category.mutations.push(mutation);
            }
            None => categories.push(CategorySummary {
                mutation_type: mutation.mutation_type,
                mutations: vec![mutation],
                number_of_transactions: 1,
                total: amount,
                percentage: Decimal::ZERO,
            }),
        }
    }

    let total: Decimal = categories.iter().map(|c| c.total).sum();
    for category in &mut categories {
        category.percentage = percentage(category.total, total);
    }
    (categories, total)
}

/// Partition `mutations` into income and expense and group each by channel.
///
/// Mutations outside `range` are ignored; the rest are processed in
/// timestamp order, ties broken by id, so channel groups appear in
/// first-seen order.
#[must_use]
pub fn summarize(mut mutations: Vec<Mutation>, range: SummaryRange) -> MutationSummary {
    mutations.retain(|m| range.contains(m.created_at));
    mutations.sort_by_key(|m| (m.created_at, m.id));

    let (credits, debits): (Vec<_>, Vec<_>) = mutations
        .into_iter()
        .partition(|m| m.transaction_type == TransactionType::Credit);

    let (income_categories, total_income) = group(credits);
    let (expense_categories, total_expense) = group(debits);
    let grand_total = total_income + total_expense;

    MutationSummary {
        income: DirectionSummary {
            categories: income_categories,
            total: total_income,
            percentage: percentage(total_income, grand_total),
        },
        expense: DirectionSummary {
            categories: expense_categories,
            total: total_expense,
            percentage: percentage(total_expense, grand_total),
        },
        total_earnings: total_income - total_expense,
        range,
    }
}
