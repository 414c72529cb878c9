//! Profile routes: profile read and update, contact changes confirmed by
//! OTP, and signature-gated password/PIN changes.

use axum::{
    Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::HeaderMap,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::views::ProfileView;
use crate::extract::Json;
use crate::{AppState, error::ApiError, middleware::AuthUser, response::ApiResponse};
use rupi_core::otp::{IssueOutcome, OtpPurpose};
use rupi_core::profile::ProfileUpdate;
use rupi_core::storage::AvatarUpload;
use rupi_core::user::ContactKind;
use rupi_shared::auth::{OtpRequest, SetPinRequest};

/// Header carrying the signature from `verify-password`/`verify-pin`.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Creates the user router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/change-email", post(request_email_change))
        .route("/user/change-email/resend", post(resend_email_change))
        .route("/user/change-email/verify", post(verify_email_change))
        .route("/user/change-phone", post(request_phone_change))
        .route("/user/change-phone/resend", post(resend_phone_change))
        .route("/user/change-phone/verify", post(verify_phone_change))
        .route("/user/verify-password", post(verify_password))
        .route("/user/verify-pin", post(verify_pin))
        .route("/user/change-password", put(change_password))
        .route("/user/change-pin", put(change_pin))
}

#[derive(Debug, Deserialize)]
struct ChangeEmailRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ChangePhoneRequest {
    phone: String,
}

#[derive(Debug, Deserialize)]
struct PasswordRequest {
    password: String,
}

#[derive(Debug, Deserialize)]
struct PinRequest {
    pin: String,
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    password: String,
    confirm_password: String,
}

#[derive(Debug, Serialize)]
struct SignatureResponse {
    signature: String,
}

/// GET /user/profile
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<ProfileView>, ApiError> {
    let user = state.profiles.get(auth.user_id()).await?;
    Ok(ApiResponse::ok("Profile retrieved", user.into()))
}

/// PUT /user/profile - multipart with optional `name` and `avatar`.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<ProfileView>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let mut update = ProfileUpdate::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        match field.name() {
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                update.name = Some(text);
            }
            Some("avatar") => {
                let filename = field.file_name().map(ToString::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                // an empty file part means no file was picked
                if !bytes.is_empty() {
                    update.avatar = Some(AvatarUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let user = state.profiles.update(auth.user_id(), update).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(ApiResponse::ok("Profile updated", user.into()))
}

async fn request_change(
    state: &AppState,
    auth: &AuthUser,
    kind: ContactKind,
    value: &str,
) -> Result<ApiResponse<()>, ApiError> {
    let outcome = state
        .otps
        .request_change(auth.user_id(), kind, value, Utc::now())
        .await?;
    let message = match (kind, outcome) {
        (_, IssueOutcome::Suppressed) => "OTP already sent",
        (ContactKind::Email, IssueOutcome::Issued) => "OTP sent to your new email",
        (ContactKind::Phone, IssueOutcome::Issued) => "OTP sent to your new phone number",
    };
    Ok(ApiResponse::message(message))
}

/// POST /user/change-email
async fn request_email_change(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangeEmailRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    request_change(&state, &auth, ContactKind::Email, &payload.email).await
}

/// POST /user/change-phone
async fn request_phone_change(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePhoneRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    request_change(&state, &auth, ContactKind::Phone, &payload.phone).await
}

/// POST /user/change-email/resend
async fn resend_email_change(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .otps
        .resend(auth.user_id(), OtpPurpose::ChangeEmail, Utc::now())
        .await?;
    Ok(ApiResponse::message("OTP resent to your new email"))
}

/// POST /user/change-phone/resend
async fn resend_phone_change(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .otps
        .resend(auth.user_id(), OtpPurpose::ChangePhone, Utc::now())
        .await?;
    Ok(ApiResponse::message("OTP resent to your new phone number"))
}

/// POST /user/change-email/verify
async fn verify_email_change(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OtpRequest>,
) -> Result<ApiResponse<ProfileView>, ApiError> {
    let user = state
        .otps
        .verify(auth.user_id(), OtpPurpose::ChangeEmail, &payload.otp, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Email changed successfully", user.into()))
}

/// POST /user/change-phone/verify
async fn verify_phone_change(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OtpRequest>,
) -> Result<ApiResponse<ProfileView>, ApiError> {
    let user = state
        .otps
        .verify(auth.user_id(), OtpPurpose::ChangePhone, &payload.otp, Utc::now())
        .await?;
    Ok(ApiResponse::ok("Phone number changed successfully", user.into()))
}

/// POST /user/verify-password - Returns the signature for `change-password`.
async fn verify_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PasswordRequest>,
) -> Result<ApiResponse<SignatureResponse>, ApiError> {
    let signature = state
        .users
        .verify_password(auth.user_id(), &payload.password)
        .await?;
    Ok(ApiResponse::ok("Password verified", SignatureResponse { signature }))
}

/// POST /user/verify-pin - Returns the signature for `change-pin`.
async fn verify_pin(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<PinRequest>,
) -> Result<ApiResponse<SignatureResponse>, ApiError> {
    let signature = state.users.verify_pin(auth.user_id(), &payload.pin).await?;
    Ok(ApiResponse::ok("PIN verified", SignatureResponse { signature }))
}

fn signature(headers: &HeaderMap) -> Option<&str> {
    headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok())
}

/// PUT /user/change-password
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .users
        .change_password(
            auth.user_id(),
            signature(&headers),
            &payload.password,
            &payload.confirm_password,
        )
        .await?;
    Ok(ApiResponse::message("Password changed successfully"))
}

/// PUT /user/change-pin
async fn change_pin(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<SetPinRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .users
        .change_pin(
            auth.user_id(),
            signature(&headers),
            &payload.pin,
            &payload.confirm_pin,
        )
        .await?;
    Ok(ApiResponse::message("PIN changed successfully"))
}
