//! Integration tests for balance booking and database guards.
//!
//! Run against a migrated `PostgreSQL` with `cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use tokio::task::JoinSet;

use rupi_core::mutation::TransactionPurpose;
use rupi_core::qris::{PaymentLedger, QrisDebit, QrisError};
use rupi_db::MutationRepository;
use rupi_db::entities::{mutations, users};
use rupi_shared::types::UserId;

fn debit(user_id: UserId, amount: rust_decimal::Decimal) -> QrisDebit {
    QrisDebit {
        user_id,
        amount,
        merchant_name: "Warung Bu Sri".to_string(),
        merchant_account: Some("9360001234".to_string()),
        description: None,
        purpose: TransactionPurpose::Purchase,
        at: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_debit_updates_balance_and_appends_mutation() {
    let db = common::connect().await;
    let id = common::insert_user(&db, dec!(100000)).await;
    let repo = MutationRepository::new(db.clone());

    let mutation = repo
        .record_debit(debit(UserId::from_uuid(id), dec!(15000.50)))
        .await
        .expect("debit");

    let user = users::Entity::find_by_id(id).one(&db).await.unwrap().unwrap();
    assert_eq!(user.balance, dec!(84999.50));
    let row = mutations::Entity::find_by_id(mutation.id.into_inner())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.amount, dec!(15000.50));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_debit_rejects_overdraft_without_side_effects() {
    let db = common::connect().await;
    let id = common::insert_user(&db, dec!(1000)).await;
    let repo = MutationRepository::new(db.clone());

    let err = repo
        .record_debit(debit(UserId::from_uuid(id), dec!(1000.01)))
        .await
        .unwrap_err();
    assert!(matches!(err, QrisError::InsufficientBalance));

    let user = users::Entity::find_by_id(id).one(&db).await.unwrap().unwrap();
    assert_eq!(user.balance, dec!(1000));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_debits_never_overdraw() {
    let db = common::connect().await;
    let id = common::insert_user(&db, dec!(100000)).await;
    let repo = Arc::new(MutationRepository::new(db.clone()));

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let repo = Arc::clone(&repo);
        tasks.spawn(async move {
            repo.record_debit(debit(UserId::from_uuid(id), dec!(10000)))
                .await
        });
    }

    let mut succeeded = 0;
    while let Some(result) = tasks.join_next().await {
        match result.expect("task panicked") {
            Ok(_) => succeeded += 1,
            Err(QrisError::InsufficientBalance) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(succeeded, 10);
    let user = users::Entity::find_by_id(id).one(&db).await.unwrap().unwrap();
    assert_eq!(user.balance, dec!(0));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_mutations_are_append_only() {
    let db = common::connect().await;
    let id = common::insert_user(&db, dec!(100000)).await;
    let repo = MutationRepository::new(db.clone());
    let mutation = repo
        .record_debit(debit(UserId::from_uuid(id), dec!(500)))
        .await
        .expect("debit");

    let result = mutations::ActiveModel {
        id: Set(mutation.id.into_inner()),
        amount: Set(dec!(1)),
        ..Default::default()
    }
    .update(&db)
    .await;

    let err = result.expect_err("update must be rejected");
    assert!(err.to_string().contains("Mutations are immutable"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_balance_check_constraint() {
    let db = common::connect().await;
    let id = common::insert_user(&db, dec!(10)).await;

    let result = users::ActiveModel {
        id: Set(id),
        balance: Set(dec!(-1)),
        ..Default::default()
    }
    .update(&db)
    .await;

    assert!(result.is_err());
}
