//! Authentication routes: signup, signin, email verification, password
//! reset, token refresh and PIN setup.

use axum::{Router, extract::State, routing::post};
use chrono::Utc;
use tracing::{info, warn};

use crate::extract::Json;
use crate::{AppState, error::ApiError, middleware::AuthUser, response::ApiResponse};
use rupi_core::otp::OtpPurpose;
use rupi_core::user::SignupInput;
use rupi_shared::TokenType;
use rupi_shared::auth::{
    ForgotPasswordRequest, OtpRequest, RefreshRequest, RefreshResponse, ResetPasswordRequest,
    SetPinRequest, SigninRequest, SigninResponse, SignupRequest, TokenPair,
};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/forgot-password/request", post(request_password_reset))
        .route("/auth/forgot-password", post(reset_password))
        .route("/auth/refresh-token", post(refresh))
}

/// Routes that need an access token (requires auth middleware to be applied
/// externally).
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/verify", post(verify_email))
        .route("/auth/verify/resend", post(resend_verification))
        .route("/auth/set-pin", post(set_pin))
}

/// POST /auth/signup - Register and send the email verification code.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<ApiResponse<TokenPair>, ApiError> {
    let user = state
        .users
        .signup(SignupInput {
            full_name: payload.full_name,
            username: payload.username,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
            confirm_password: payload.confirm_password,
        })
        .await?;

    // the account exists either way; the code can be resent
    if let Err(e) = state.otps.issue_verification(&user, Utc::now()).await {
        warn!(user_id = %user.id, error = %e, "failed to send verification code");
    }

    let tokens = state
        .jwt_service
        .generate_pair(user.id.into_inner(), &user.username)?;

    info!(user_id = %user.id, "signup completed");
    Ok(ApiResponse::created(
        "User registered successfully. Please verify your email.",
        tokens,
    ))
}

/// POST /auth/signin - Authenticate and return tokens.
async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Result<ApiResponse<SigninResponse>, ApiError> {
    let user = match state.users.signin(&payload.username, &payload.password).await {
        Ok(user) => user,
        Err(e) => {
            info!(username = %payload.username, "failed signin attempt");
            return Err(e.into());
        }
    };

    let tokens = state
        .jwt_service
        .generate_pair(user.id.into_inner(), &user.username)?;

    info!(user_id = %user.id, "user signed in");
    Ok(ApiResponse::ok(
        "Signin successful",
        SigninResponse {
            tokens,
            is_verified: user.email_verified,
            has_pin: user.has_pin(),
        },
    ))
}

/// POST /auth/verify - Confirm the registration email.
async fn verify_email(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OtpRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .otps
        .verify(
            auth.user_id(),
            OtpPurpose::VerifyEmail,
            &payload.otp,
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::message("Email verified successfully"))
}

/// POST /auth/verify/resend - Send a new verification code.
async fn resend_verification(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .otps
        .resend(auth.user_id(), OtpPurpose::VerifyEmail, Utc::now())
        .await?;
    Ok(ApiResponse::message("Verification code sent to your email"))
}

/// POST /auth/forgot-password/request - Send a reset code.
async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .otps
        .request_password_reset(&payload.username, Utc::now())
        .await?;
    Ok(ApiResponse::message(
        "If the account exists, a reset code has been sent to its email",
    ))
}

/// POST /auth/forgot-password - Set a new password with the reset code.
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .otps
        .reset_password(
            &payload.username,
            &payload.otp,
            &payload.password,
            &payload.confirm_password,
            Utc::now(),
        )
        .await?;
    Ok(ApiResponse::message("Password reset successfully"))
}

/// POST /auth/refresh-token - Exchange a refresh token for an access token.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<ApiResponse<RefreshResponse>, ApiError> {
    let claims = state
        .jwt_service
        .validate_kind(&payload.refresh_token, TokenType::Refresh)?;

    let access_token = state
        .jwt_service
        .generate_access_token(claims.user_id(), &claims.username)?;

    Ok(ApiResponse::ok(
        "Token refreshed",
        RefreshResponse {
            access_token,
            expires_in: state.jwt_service.access_token_expires_in(),
        },
    ))
}

/// POST /auth/set-pin - Set the first transaction PIN.
async fn set_pin(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SetPinRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .users
        .set_pin(auth.user_id(), &payload.pin, &payload.confirm_pin)
        .await?;
    info!(user_id = %auth.user_id(), "pin set");
    Ok(ApiResponse::message("PIN set successfully"))
}
