//! Notification dispatch over SMTP and the WhatsApp gateway.

use rupi_core::user::{Notification, Notifier, UserError};
use rupi_shared::{EmailService, WhatsappClient};

/// Routes each notification to its transport.
#[derive(Debug, Clone)]
pub struct DispatchNotifier {
    email: EmailService,
    whatsapp: WhatsappClient,
}

impl DispatchNotifier {
    /// Creates a notifier over both transports.
    #[must_use]
    pub const fn new(email: EmailService, whatsapp: WhatsappClient) -> Self {
        Self { email, whatsapp }
    }
}

impl Notifier for DispatchNotifier {
    async fn send(&self, notification: Notification) -> Result<(), UserError> {
        match notification {
            Notification::EmailCode {
                to,
                name,
                subject,
                code,
                valid_minutes,
            } => self
                .email
                .send_otp_email(&to, &name, &subject, &code, valid_minutes)
                .await
                .map_err(|e| UserError::notification(e.to_string())),
            Notification::WhatsappCode {
                phone,
                code,
                valid_minutes,
            } => self
                .whatsapp
                .send_otp(&phone, &code, valid_minutes)
                .await
                .map_err(|e| UserError::notification(e.to_string())),
            Notification::Alert {
                to,
                name,
                subject,
                detail,
            } => self
                .email
                .send_alert(&to, &name, &subject, &detail)
                .await
                .map_err(|e| UserError::notification(e.to_string())),
        }
    }

    async fn check_phone(&self, phone: &str) -> Result<bool, UserError> {
        self.whatsapp
            .check_number(phone)
            .await
            .map_err(|e| UserError::notification(e.to_string()))
    }
}
