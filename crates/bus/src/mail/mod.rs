//! Outbound email: message composition, the SMTP session and sendmail mode.

pub mod message;
pub mod sendmail;
pub mod settings;
pub mod smtp;

pub use message::MailMessage;
pub use sendmail::{decode_input, prepare_sendmail, PreparedMessage, SENDMAIL_HEADER};
pub use settings::SmtpSettings;
pub use smtp::{Reply, SmtpClient};

use thiserror::Error;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("SMTP error {code}: {text}")]
    Smtp { code: u16, text: String },

    #[error("SMTP connection error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("TLS negotiation failed: {0}")]
    Tls(String),

    #[error("Malformed SMTP reply: {0}")]
    Protocol(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("No recipients")]
    NoRecipients,
}
