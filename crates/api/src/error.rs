//! API error type rendering the response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use rupi_shared::AppError;

/// Message returned in place of infrastructure failures.
const INTERNAL_MESSAGE: &str = "An error occurred";

/// Error returned by handlers.
///
/// Anything convertible into [`AppError`] converts into this with `?`. Server
/// errors are logged and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// A 400 with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AppError::Validation(msg.into()))
    }

    /// A 401 with the given message.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(msg.into()))
    }

    /// The HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "request failed");
            INTERNAL_MESSAGE
        } else {
            self.0.message()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
