//! Initial database migration.
//!
//! Creates the enums, the `users`, `otps` and `mutations` tables, their
//! indexes, and the trigger that keeps mutations append-only.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(OTPS_SQL).await?;
        db.execute_unprepared(MUTATIONS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- What a one-time code confirms
CREATE TYPE otp_purpose AS ENUM (
    'change_email',
    'change_phone',
    'verify_email',
    'forgot_password'
);

-- Money in or out
CREATE TYPE transaction_type AS ENUM ('CREDIT', 'DEBIT');

-- Channel
CREATE TYPE mutation_type AS ENUM ('QRIS', 'TRANSFER');

-- Purpose tag picked by the payer
CREATE TYPE transaction_purpose AS ENUM (
    'PURCHASE',
    'INVESTMENT',
    'TRANSFER',
    'OTHER'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(30) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    alias VARCHAR(255),
    email VARCHAR(255) NOT NULL UNIQUE,
    phone VARCHAR(20) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    pin_hash VARCHAR(255),
    avatar VARCHAR(255) NOT NULL DEFAULT 'uploads/default.png',
    email_verified BOOLEAN NOT NULL DEFAULT false,
    account_number CHAR(10) NOT NULL UNIQUE,
    balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_users_balance_non_negative CHECK (balance >= 0)
);
";

const OTPS_SQL: &str = r"
CREATE TABLE otps (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    purpose otp_purpose NOT NULL,
    code_hash VARCHAR(255) NOT NULL,
    pending_value VARCHAR(255),
    expires_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- one live code per (user, purpose)
    CONSTRAINT uq_otps_user_purpose UNIQUE (user_id, purpose)
);
";

const MUTATIONS_SQL: &str = r"
CREATE TABLE mutations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount NUMERIC(19, 2) NOT NULL,
    transaction_type transaction_type NOT NULL,
    mutation_type mutation_type NOT NULL,
    counterparty_name VARCHAR(255) NOT NULL,
    counterparty_account VARCHAR(64),
    description TEXT,
    transaction_purpose transaction_purpose NOT NULL DEFAULT 'OTHER',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_mutations_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_mutations_user_created ON mutations(user_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: touch_updated_at
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at := now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
BEFORE UPDATE ON users
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();

-- ============================================================
-- FUNCTION: prevent_mutation_modification
-- Mutations are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_mutation_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Mutations are immutable.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_mutation_mod
BEFORE UPDATE ON mutations
FOR EACH ROW
EXECUTE FUNCTION prevent_mutation_modification();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- ============================================================

DROP TRIGGER IF EXISTS trg_prevent_mutation_mod ON mutations;
DROP TRIGGER IF EXISTS trg_users_updated_at ON users;

DROP FUNCTION IF EXISTS prevent_mutation_modification();
DROP FUNCTION IF EXISTS touch_updated_at();

DROP TABLE IF EXISTS mutations CASCADE;
DROP TABLE IF EXISTS otps CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS transaction_purpose;
DROP TYPE IF EXISTS mutation_type;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS otp_purpose;
";
