//! Database seeder for Rupi development and testing.
//!
//! Seeds two verified demo customers with a PIN, books a month of salary,
//! transfer and QRIS mutations through the ledger so balances match the
//! history, and prints a merchant QRIS payload to pay with.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use rupi_core::auth::hash_secret;
use rupi_core::mutation::{Mutation, MutationType, TransactionPurpose, TransactionType};
use rupi_core::qris::MerchantPayload;
use rupi_db::MutationRepository;
use rupi_db::entities::users;
use rupi_shared::types::{MutationId, UserId};

/// Password of every demo user.
const DEMO_PASSWORD: &str = "rahasia123";
/// PIN of every demo user.
const DEMO_PIN: &str = "123456";

struct DemoUser {
    id: &'static str,
    username: &'static str,
    full_name: &'static str,
    email: &'static str,
    phone: &'static str,
    account_number: &'static str,
}

const DEMO_USERS: [DemoUser; 2] = [
    DemoUser {
        id: "00000000-0000-0000-0000-000000000001",
        username: "budi",
        full_name: "Budi Santoso",
        email: "budi@rupi.dev",
        phone: "081234567890",
        account_number: "1234567890",
    },
    DemoUser {
        id: "00000000-0000-0000-0000-000000000002",
        username: "siti",
        full_name: "Siti Aminah",
        email: "siti@rupi.dev",
        phone: "081355554444",
        account_number: "2345678901",
    },
];

/// (days ago, amount, direction, channel, counterparty, purpose)
const HISTORY: [(i64, i64, TransactionType, MutationType, &str, TransactionPurpose); 6] = [
    (
        20,
        7_500_000,
        TransactionType::Credit,
        MutationType::Transfer,
        "PT Maju Jaya",
        TransactionPurpose::Transfer,
    ),
    (
        15,
        250_000,
        TransactionType::Debit,
        MutationType::Transfer,
        "Andi Wijaya",
        TransactionPurpose::Transfer,
    ),
    (
        9,
        45_000,
        TransactionType::Debit,
        MutationType::Qris,
        "Kopi Kenangan",
        TransactionPurpose::Purchase,
    ),
    (
        6,
        1_000_000,
        TransactionType::Debit,
        MutationType::Transfer,
        "Bibit Reksadana",
        TransactionPurpose::Investment,
    ),
    (
        3,
        150_000,
        TransactionType::Credit,
        MutationType::Transfer,
        "Rina Kusuma",
        TransactionPurpose::Transfer,
    ),
    (
        1,
        32_500,
        TransactionType::Debit,
        MutationType::Qris,
        "Warung Bu Sri",
        TransactionPurpose::Purchase,
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("RUPI__DATABASE__URL"))
        .context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = rupi_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding demo users...");
    let password_hash = hash_secret(DEMO_PASSWORD)?;
    let pin_hash = hash_secret(DEMO_PIN)?;
    let ledger = MutationRepository::new(db.clone());

    for demo in &DEMO_USERS {
        let id = Uuid::parse_str(demo.id)?;
        if seed_user(&db, id, demo, &password_hash, &pin_hash).await? {
            println!("Seeding history for {}...", demo.username);
            seed_history(&ledger, UserId::from_uuid(id)).await?;
        }
    }

    let merchant = MerchantPayload {
        name: "Warung Bu Sri".to_string(),
        city: "Jakarta".to_string(),
        account: Some("9360001234567890".to_string()),
        amount: Some(Decimal::new(25_000, 0)),
    };
    println!("Demo merchant QRIS (25000 IDR):");
    println!("  {}", merchant.encode()?);

    println!("Seeding complete! Sign in with username budi or siti, password {DEMO_PASSWORD}, PIN {DEMO_PIN}.");
    Ok(())
}

/// Inserts a demo user. Returns false when it already exists.
async fn seed_user(
    db: &DatabaseConnection,
    id: Uuid,
    demo: &DemoUser,
    password_hash: &str,
    pin_hash: &str,
) -> anyhow::Result<bool> {
    if users::Entity::find_by_id(id).one(db).await?.is_some() {
        println!("  {} already exists, skipping...", demo.username);
        return Ok(false);
    }

    users::ActiveModel {
        id: Set(id),
        username: Set(demo.username.to_string()),
        full_name: Set(demo.full_name.to_string()),
        email: Set(demo.email.to_string()),
        phone: Set(demo.phone.to_string()),
        password_hash: Set(password_hash.to_string()),
        pin_hash: Set(Some(pin_hash.to_string())),
        email_verified: Set(true),
        account_number: Set(demo.account_number.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .with_context(|| format!("Failed to insert {}", demo.username))?;

    println!("  Created {} ({})", demo.username, demo.account_number);
    Ok(true)
}

/// Books the demo history oldest first, so debits are always covered.
async fn seed_history(ledger: &MutationRepository, user_id: UserId) -> anyhow::Result<()> {
    let now = Utc::now();
    for (days_ago, amount, transaction_type, mutation_type, counterparty, purpose) in HISTORY {
        let mutation = Mutation {
            id: MutationId::new(),
            user_id,
            amount: Decimal::new(amount, 0),
            transaction_type,
            mutation_type,
            counterparty_name: counterparty.to_string(),
            counterparty_account: None,
            description: None,
            purpose,
            created_at: now - Duration::days(days_ago),
        };
        ledger.record(&mutation).await?;
    }
    println!("  Booked {} mutations", HISTORY.len());
    Ok(())
}
