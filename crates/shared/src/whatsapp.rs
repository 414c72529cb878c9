//! WhatsApp gateway client.
//!
//! The gateway accepts `POST {base_url}/send-message` and
//! `POST {base_url}/check-number` with a JSON body and an `Authorization`
//! header carrying the API key.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::WhatsappConfig;

/// WhatsApp gateway errors.
#[derive(Debug, Error)]
pub enum WhatsappError {
    /// The HTTP client could not be built.
    #[error("Failed to build WhatsApp client: {0}")]
    Client(String),
    /// Transport level failure.
    #[error("Failed to reach WhatsApp gateway: {0}")]
    Transport(String),
    /// Gateway answered with a non-success status.
    #[error("WhatsApp gateway rejected message with status {0}")]
    Rejected(u16),
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    phone: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckNumber<'a> {
    number: &'a str,
}

/// Client for the WhatsApp messaging gateway.
#[derive(Clone)]
pub struct WhatsappClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for WhatsappClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsappClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl WhatsappClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns `WhatsappError::Client` if the HTTP client cannot be built.
    pub fn new(config: &WhatsappConfig) -> Result<Self, WhatsappError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WhatsappError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/send-message", self.base_url)
    }

    fn check_endpoint(&self) -> String {
        format!("{}/check-number", self.base_url)
    }

    /// Asks the gateway whether a number is registered on WhatsApp.
    ///
    /// A 400 answer means the number is not valid and yields `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any other non-2xx answer.
    pub async fn check_number(&self, phone: &str) -> Result<bool, WhatsappError> {
        let response = self
            .http
            .post(self.check_endpoint())
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&CheckNumber { number: phone })
            .send()
            .await
            .map_err(|e| WhatsappError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(WhatsappError::Rejected(status.as_u16()));
        }
        Ok(true)
    }

    /// Sends a text message to a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx answer.
    pub async fn send_message(&self, phone: &str, message: &str) -> Result<(), WhatsappError> {
        let response = self
            .http
            .post(self.endpoint())
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&SendMessage { phone, message })
            .send()
            .await
            .map_err(|e| WhatsappError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "whatsapp gateway rejected message");
            return Err(WhatsappError::Rejected(status.as_u16()));
        }

        Ok(())
    }

    /// Sends a one-time code.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx answer.
    pub async fn send_otp(
        &self,
        phone: &str,
        code: &str,
        valid_minutes: u64,
    ) -> Result<(), WhatsappError> {
        let message = format!(
            "Your Rupi verification code is {code}. Valid for {valid_minutes} minutes. Do not share this code with anyone."
        );
        self.send_message(phone, &message).await
    }
}
