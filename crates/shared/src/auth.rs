//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a signed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token sent with every request.
    Access,
    /// Long-lived token exchanged for a new access token.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Username at issue time.
    pub username: String,
    /// Token kind.
    pub typ: TokenType,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, username: &str, typ: TokenType, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            username: username.to_string(),
            typ,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// True for access tokens.
    #[must_use]
    pub fn is_access(&self) -> bool {
        self.typ == TokenType::Access
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// Signup request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    /// Full name.
    pub full_name: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Password.
    pub password: String,
    /// Password repeated.
    pub confirm_password: String,
}

/// Signin request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Signin response payload.
#[derive(Debug, Clone, Serialize)]
pub struct SigninResponse {
    /// Issued tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// Whether the registration email was confirmed.
    pub is_verified: bool,
    /// Whether a transaction PIN is set.
    pub has_pin: bool,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: String,
}

/// Refresh token response.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    /// Fresh access token.
    pub access_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

/// Carries a one-time code.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpRequest {
    /// The code as delivered.
    pub otp: String,
}

/// Starts a password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Login name.
    pub username: String,
}

/// Completes a password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    /// Login name.
    pub username: String,
    /// The code as delivered.
    pub otp: String,
    /// New password.
    pub password: String,
    /// New password repeated.
    pub confirm_password: String,
}

/// Sets the first transaction PIN.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPinRequest {
    /// Six digit PIN.
    pub pin: String,
    /// PIN repeated.
    pub confirm_pin: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_roundtrip_json() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, "budi", TokenType::Refresh, Utc::now() + Duration::days(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["typ"], "refresh");
        assert_eq!(json["username"], "budi");

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back.user_id(), id);
        assert!(!back.is_access());
    }

    #[test]
    fn test_signin_response_flattens_tokens() {
        let response = SigninResponse {
            tokens: TokenPair::new("a".into(), "r".into(), 900),
            is_verified: true,
            has_pin: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["expires_in"], 900);
        assert_eq!(json["has_pin"], false);
    }
}
