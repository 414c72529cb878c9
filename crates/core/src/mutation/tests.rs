//! Mutation range, summary and listing tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use rstest::rstest;
use rupi_shared::types::{MutationId, PageRequest, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::testing::{self, MemoryMutations};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn now() -> DateTime<Utc> {
    at(2024, 7, 29, 16, 2)
}

fn july() -> SummaryRange {
    SummaryRange::resolve(Some(2024), Some(7), now()).unwrap()
}

// ---------------------------------------------------------------------------
// SummaryRange
// ---------------------------------------------------------------------------

#[test]
fn test_explicit_month_covers_whole_wib_month() {
    let range = july();
    assert_eq!(
        range.start_local(),
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    );
    // 2024-07-01 00:00 WIB
    assert_eq!(range.start, at(2024, 6, 30, 17, 0));
    assert_eq!(range.end, at(2024, 7, 31, 17, 0) - Duration::nanoseconds(1));
    assert_eq!(range.end_local().nanosecond(), 999_999_999);
}

#[test]
fn test_december_rolls_into_next_year() {
    let range = SummaryRange::resolve(Some(2023), Some(12), now()).unwrap();
    assert_eq!(range.end, at(2023, 12, 31, 17, 0) - Duration::nanoseconds(1));
}

#[test]
fn test_default_range_is_current_wib_month_to_now() {
    // 2024-08-01 01:00 WIB is still July in UTC
    let now = at(2024, 7, 31, 18, 0);
    let range = SummaryRange::resolve(None, None, now).unwrap();
    assert_eq!(range.start, at(2024, 7, 31, 17, 0));
    assert_eq!(range.end, now);
}

#[rstest]
#[case(Some(2024), None, "Both 'year' and 'month' parameters must be provided, or none at all.")]
#[case(None, Some(7), "Both 'year' and 'month' parameters must be provided, or none at all.")]
#[case(Some(1899), Some(7), "Year must be between 1900 and 2100")]
#[case(Some(2101), Some(7), "Year must be between 1900 and 2100")]
#[case(Some(2024), Some(0), "Month must be between 1 and 12")]
#[case(Some(2024), Some(13), "Month must be between 1 and 12")]
#[case(Some(2024), Some(8), "Cannot query data for future dates.")]
fn test_range_rejections(
    #[case] year: Option<i32>,
    #[case] month: Option<u32>,
    #[case] message: &str,
) {
    let err = SummaryRange::resolve(year, month, now()).unwrap_err();
    assert_eq!(err.to_string(), message);
}

proptest! {
    #[test]
    fn prop_single_parameter_always_fails(year in any::<i32>(), month in any::<u32>(), pick_year in any::<bool>()) {
        let result = if pick_year {
            SummaryRange::resolve(Some(year), None, now())
        } else {
            SummaryRange::resolve(None, Some(month), now())
        };
        prop_assert!(matches!(result, Err(MutationError::Validation(_))));
    }
}

// ---------------------------------------------------------------------------
// summarize
// ---------------------------------------------------------------------------

#[test]
fn test_summary_example() {
    let user = UserId::new();
    let mutations = vec![
        testing::mutation(user, 10_000, TransactionType::Debit, MutationType::Qris, at(2024, 7, 29, 13, 30)),
        testing::mutation(user, 15_000, TransactionType::Debit, MutationType::Transfer, at(2024, 7, 29, 13, 21)),
    ];

    let summary = summarize(mutations, july());

    assert_eq!(summary.income.total, Decimal::ZERO);
    assert_eq!(summary.income.percentage, Decimal::ZERO);
    assert!(summary.income.categories.is_empty());
    assert_eq!(summary.expense.total, dec!(25000));
    assert_eq!(summary.expense.percentage, dec!(100));
    assert_eq!(summary.total_earnings, dec!(-25000));

    // the transfer came first
    let shares: Vec<_> = summary
        .expense
        .categories
        .iter()
        .map(|c| (c.mutation_type, c.number_of_transactions, c.total, c.percentage))
        .collect();
    assert_eq!(
        shares,
        vec![
            (MutationType::Transfer, 1, dec!(15000), dec!(60)),
            (MutationType::Qris, 1, dec!(10000), dec!(40)),
        ]
    );
}

#[test]
fn test_summary_groups_and_direction_shares() {
    let user = UserId::new();
    let t = |d| at(2024, 7, d, 3, 0);
    let mutations = vec![
        testing::mutation(user, 10_000, TransactionType::Credit, MutationType::Qris, t(2)),
        testing::mutation(user, 20_000, TransactionType::Credit, MutationType::Transfer, t(3)),
        testing::mutation(user, 30_000, TransactionType::Credit, MutationType::Qris, t(4)),
        testing::mutation(user, 40_000, TransactionType::Debit, MutationType::Transfer, t(5)),
        // outside the range
        testing::mutation(user, 99_000, TransactionType::Debit, MutationType::Qris, at(2024, 6, 30, 16, 0)),
    ];

    let summary = summarize(mutations, july());

    assert_eq!(summary.income.total, dec!(60000));
    assert_eq!(summary.expense.total, dec!(40000));
    assert_eq!(summary.income.percentage, dec!(60));
    assert_eq!(summary.expense.percentage, dec!(40));
    assert_eq!(summary.total_earnings, dec!(20000));

    let qris = &summary.income.categories[0];
    assert_eq!(qris.mutation_type, MutationType::Qris);
    assert_eq!(qris.number_of_transactions, 2);
    assert_eq!(qris.total, dec!(40000));
    assert_eq!(qris.percentage, dec!(66.67));
    assert_eq!(summary.income.categories[1].percentage, dec!(33.33));
    assert_eq!(summary.expense.categories.len(), 1);
}

#[test]
fn test_empty_summary_is_all_zero() {
    let summary = summarize(Vec::new(), july());
    assert_eq!(summary.income.percentage, Decimal::ZERO);
    assert_eq!(summary.expense.percentage, Decimal::ZERO);
    assert_eq!(summary.total_earnings, Decimal::ZERO);
}

#[test]
fn test_simultaneous_mutations_group_in_id_order() {
    let user = UserId::new();
    let when = at(2024, 7, 10, 5, 0);
    let mut qris = testing::mutation(user, 10_000, TransactionType::Debit, MutationType::Qris, when);
    let mut transfer =
        testing::mutation(user, 15_000, TransactionType::Debit, MutationType::Transfer, when);
    qris.id = MutationId::from_uuid(uuid::Uuid::from_u128(1));
    transfer.id = MutationId::from_uuid(uuid::Uuid::from_u128(2));

    let order = |mutations: Vec<Mutation>| -> Vec<MutationType> {
        summarize(mutations, july())
            .expense
            .categories
            .iter()
            .map(|c| c.mutation_type)
            .collect()
    };

    let forward = order(vec![qris.clone(), transfer.clone()]);
    let backward = order(vec![transfer, qris]);
    assert_eq!(forward, vec![MutationType::Qris, MutationType::Transfer]);
    assert_eq!(forward, backward);
}

fn arb_mutation() -> impl Strategy<Value = Mutation> {
    (
        0i64..5_000_000,
        any::<bool>(),
        any::<bool>(),
        0i64..(30 * 24 * 60),
    )
        .prop_map(|(amount, credit, qris, minutes)| {
            testing::mutation(
                UserId::new(),
                amount,
                if credit { TransactionType::Credit } else { TransactionType::Debit },
                if qris { MutationType::Qris } else { MutationType::Transfer },
                at(2024, 7, 1, 0, 0) + Duration::minutes(minutes),
            )
        })
}

proptest! {
    /// Category totals add up to their direction total, and shares add up
    /// to 100 unless the direction is empty.
    #[test]
    fn prop_category_totals_and_shares(mutations in prop::collection::vec(arb_mutation(), 0..40)) {
        let summary = summarize(mutations, july());

        for direction in [&summary.income, &summary.expense] {
            let total: Decimal = direction.categories.iter().map(|c| c.total).sum();
            prop_assert_eq!(total, direction.total);

            let shares: Decimal = direction.categories.iter().map(|c| c.percentage).sum();
            if direction.total.is_zero() {
                prop_assert!(direction.categories.iter().all(|c| c.percentage.is_zero()));
            } else {
                prop_assert!((shares - dec!(100)).abs() <= dec!(0.01));
            }

            let count: usize = direction.categories.iter().map(|c| c.mutations.len()).sum();
            let counted: usize = direction.categories.iter().map(|c| c.number_of_transactions).sum();
            prop_assert_eq!(count, counted);
        }

        prop_assert_eq!(summary.total_earnings, summary.income.total - summary.expense.total);
    }
}

// ---------------------------------------------------------------------------
// MutationFilter
// ---------------------------------------------------------------------------

#[test]
fn test_filter_rejects_reversed_dates() {
    let filter = MutationFilter {
        start_date: NaiveDate::from_ymd_opt(2024, 7, 10),
        end_date: NaiveDate::from_ymd_opt(2024, 7, 9),
        ..MutationFilter::default()
    };
    assert_eq!(
        filter.validate().unwrap_err().to_string(),
        "start_date must not be after end_date"
    );
}

#[test]
fn test_filter_matches_wib_days_category_and_search() {
    let user = UserId::new();
    let mut m = testing::mutation(user, 5_000, TransactionType::Debit, MutationType::Transfer, at(2024, 7, 9, 18, 0));
    m.description = Some("Cicilan motor".to_string());

    // 2024-07-10 01:00 WIB
    let on_tenth = MutationFilter {
        start_date: NaiveDate::from_ymd_opt(2024, 7, 10),
        end_date: NaiveDate::from_ymd_opt(2024, 7, 10),
        ..MutationFilter::default()
    };
    assert!(on_tenth.matches(&m));

    let on_ninth = MutationFilter {
        start_date: NaiveDate::from_ymd_opt(2024, 7, 9),
        end_date: NaiveDate::from_ymd_opt(2024, 7, 9),
        ..MutationFilter::default()
    };
    assert!(!on_ninth.matches(&m));

    let credits = MutationFilter {
        category: Some(TransactionType::Credit),
        ..MutationFilter::default()
    };
    assert!(!credits.matches(&m));

    for term in ["motor", "BU SRI", "  cicilan "] {
        let filter = MutationFilter {
            search: Some(term.to_string()),
            ..MutationFilter::default()
        };
        assert!(filter.matches(&m), "{term}");
    }
    let blank = MutationFilter {
        search: Some("   ".to_string()),
        ..MutationFilter::default()
    };
    assert_eq!(blank.search_term(), None);
}

#[rstest]
#[case(at(2024, 7, 9, 17, 55), "00:55 WIB")]
#[case(at(2024, 7, 9, 2, 5), "09:05 WIB")]
fn test_wib_time_label(#[case] instant: DateTime<Utc>, #[case] label: &str) {
    assert_eq!(wib_time_label(instant), label);
}

#[test]
fn test_wib_date_crosses_midnight() {
    assert_eq!(
        wib_date(at(2024, 7, 9, 17, 0)),
        NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()
    );
}

// ---------------------------------------------------------------------------
// MutationService
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_is_newest_first_and_paged() {
    let user = UserId::new();
    let other = UserId::new();
    let mut rows: Vec<_> = (1..=12)
        .map(|d| testing::mutation(user, 1_000 * i64::from(d), TransactionType::Debit, MutationType::Transfer, at(2024, 7, d, 5, 0)))
        .collect();
    rows.push(testing::mutation(other, 1, TransactionType::Credit, MutationType::Qris, at(2024, 7, 20, 5, 0)));
    let service = MutationService::new(Arc::new(MemoryMutations::with(rows)));

    let first = service
        .list(user, &MutationFilter::default(), PageRequest { page: 0, size: 5 })
        .await
        .unwrap();
    assert_eq!(first.total_elements, 12);
    assert_eq!(first.total_pages, 3);
    assert!(first.first);
    assert!(!first.last);
    assert_eq!(first.content[0].amount, dec!(12000));

    let last = service
        .list(user, &MutationFilter::default(), PageRequest { page: 2, size: 5 })
        .await
        .unwrap();
    assert_eq!(last.content.len(), 2);
    assert!(last.last);
    assert_eq!(last.content[1].amount, dec!(1000));
}

#[tokio::test]
async fn test_list_rejects_oversized_page() {
    let service = MutationService::new(Arc::new(MemoryMutations::default()));
    let err = service
        .list(UserId::new(), &MutationFilter::default(), PageRequest { page: 0, size: 101 })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Page size must be between 1 and 100");
}

#[tokio::test]
async fn test_get_hides_other_users_mutations() {
    let owner = UserId::new();
    let m = testing::mutation(owner, 1_000, TransactionType::Debit, MutationType::Qris, now());
    let id = m.id;
    let service = MutationService::new(Arc::new(MemoryMutations::with([m])));

    assert_eq!(service.get(owner, id).await.unwrap().id, id);
    assert!(matches!(service.get(UserId::new(), id).await, Err(MutationError::NotFound)));
    assert!(matches!(service.get(owner, MutationId::new()).await, Err(MutationError::NotFound)));
}

#[tokio::test]
async fn test_summary_reads_only_the_range() {
    let user = UserId::new();
    let rows = vec![
        testing::mutation(user, 10_000, TransactionType::Debit, MutationType::Qris, at(2024, 7, 29, 13, 30)),
        testing::mutation(user, 15_000, TransactionType::Debit, MutationType::Transfer, at(2024, 6, 29, 13, 21)),
    ];
    let service = MutationService::new(Arc::new(MemoryMutations::with(rows)));

    let summary = service.summary(user, Some(2024), Some(7), now()).await.unwrap();
    assert_eq!(summary.expense.total, dec!(10000));

    let err = service.summary(user, Some(2024), None, now()).await.unwrap_err();
    assert!(matches!(err, MutationError::Validation(_)));
}

// ---------------------------------------------------------------------------
// MutationDetail
// ---------------------------------------------------------------------------

#[test]
fn test_detail_views() {
    let owner = testing::user("budi");
    let debit = testing::mutation(owner.id, 1_000, TransactionType::Debit, MutationType::Transfer, now());
    let MutationDetail::Transfer { sender, receiver, .. } = MutationDetail::new(debit, &owner) else {
        panic!("expected a transfer view");
    };
    assert_eq!(sender.account_number.as_deref(), Some("1234567890"));
    assert_eq!(receiver.name, "Warung Bu Sri");

    let credit = testing::mutation(owner.id, 1_000, TransactionType::Credit, MutationType::Transfer, now());
    let MutationDetail::Transfer { sender, receiver, .. } = MutationDetail::new(credit, &owner) else {
        panic!("expected a transfer view");
    };
    assert_eq!(sender.name, "Warung Bu Sri");
    assert_eq!(receiver.name, "budi Santoso");

    let qris = testing::mutation(owner.id, 1_000, TransactionType::Debit, MutationType::Qris, now());
    let detail = MutationDetail::new(qris.clone(), &owner);
    assert!(matches!(&detail, MutationDetail::Merchant { merchant, .. } if merchant == "Warung Bu Sri"));
    assert_eq!(detail.mutation(), &qris);
}

#[rstest]
#[case("credit", Some(TransactionType::Credit))]
#[case(" DEBIT ", Some(TransactionType::Debit))]
#[case("refund", None)]
fn test_transaction_type_parse(#[case] raw: &str, #[case] expected: Option<TransactionType>) {
    assert_eq!(TransactionType::parse(raw), expected);
}
