//! Verification mail.

use async_trait::async_trait;
use tracing::info;

/// A plain-text mail message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Mail delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Transport refused or dropped the message.
    #[error("delivery to {to} failed: {reason}")]
    Delivery {
        /// Recipient.
        to: String,
        /// Transport error.
        reason: String,
    },
}

/// Mail transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver `message`.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Build the verification mail carrying `code`.
pub fn create_email(from: &str, receiver: &str, code: &str) -> EmailMessage {
    EmailMessage {
        from: from.to_owned(),
        to: receiver.to_owned(),
        subject: "Email Verification Code".to_owned(),
        body: format!("Your email verification code is {code}"),
    }
}

/// Sender that records deliveries in the log instead of contacting a server.
#[derive(Clone, Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "verification email sent"
        );
        Ok(())
    }
}
