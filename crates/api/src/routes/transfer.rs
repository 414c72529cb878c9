//! QRIS transfer routes.

use axum::{Router, extract::State, routing::post};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::views::MutationView;
use crate::extract::Json;
use crate::{AppState, error::ApiError, middleware::AuthUser, response::ApiResponse};
use rupi_core::mutation::TransactionPurpose;
use rupi_core::qris::QrisPayment;

/// Creates the transfer router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfer/qris/cpm", post(generate_cpm))
        .route("/transfer/qris", post(pay_qris))
}

#[derive(Debug, Deserialize)]
struct CpmRequest {
    pin: String,
}

#[derive(Debug, Serialize)]
struct CpmResponse {
    qris: String,
    expired_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct QrisPayRequest {
    qris: String,
    amount: Decimal,
    pin: String,
    description: Option<String>,
    transaction_purpose: Option<String>,
}

/// POST /transfer/qris/cpm - Customer-presented payload, valid five minutes.
async fn generate_cpm(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CpmRequest>,
) -> Result<ApiResponse<CpmResponse>, ApiError> {
    let cpm = state
        .qris
        .generate_cpm(auth.user_id(), &payload.pin, Utc::now())
        .await?;
    Ok(ApiResponse::ok(
        "QRIS generated",
        CpmResponse {
            qris: cpm.qris,
            expired_at: cpm.expired_at,
        },
    ))
}

/// POST /transfer/qris - Pay a merchant-presented payload.
async fn pay_qris(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<QrisPayRequest>,
) -> Result<ApiResponse<MutationView>, ApiError> {
    let purpose = match payload.transaction_purpose.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            TransactionPurpose::parse(raw)
                .ok_or_else(|| ApiError::validation("Invalid transaction purpose"))?,
        ),
    };

    let mutation = state
        .qris
        .pay(
            auth.user_id(),
            QrisPayment {
                qris: payload.qris,
                amount: payload.amount,
                pin: payload.pin,
                description: payload.description,
                purpose,
            },
            Utc::now(),
        )
        .await?;

    info!(user_id = %auth.user_id(), mutation_id = %mutation.id, "qris payment completed");
    Ok(ApiResponse::created("Payment successful", mutation.into()))
}
