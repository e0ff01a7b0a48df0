use thiserror::Error;

use crate::esl::EslError;
use crate::mail::EmailError;
use shared::validation::ValidationError;

/// Failure kinds shared by every bus tool.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Email template not found: {0}")]
    TemplateMissing(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("SMTP error {code}: {text}")]
    Smtp { code: u16, text: String },

    #[error("External script {script} failed: {reason}")]
    ExternalScript { script: String, reason: String },

    #[error("Query error: {0}")]
    Query(String),
}

pub type BusResult<T> = Result<T, BusError>;

impl From<sqlx::Error> for BusError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => BusError::Transport(format!("Database error: {}", err)),
            sqlx::Error::Configuration(_) => BusError::ConfigMissing(format!("Database: {}", err)),
            _ => BusError::Query(err.to_string()),
        }
    }
}

impl From<EslError> for BusError {
    fn from(err: EslError) -> Self {
        match err {
            EslError::Transport(e) => BusError::Transport(format!("Event socket: {}", e)),
            EslError::Closed => BusError::Transport("Event socket connection closed".into()),
            EslError::Auth(text) => BusError::Auth(text),
            EslError::Protocol(text) => BusError::Protocol(text),
        }
    }
}

impl From<EmailError> for BusError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::NotConfigured(what) => BusError::ConfigMissing(what),
            EmailError::Smtp { code, text } => BusError::Smtp { code, text },
            EmailError::Transport(e) => BusError::Transport(format!("SMTP: {}", e)),
            EmailError::Tls(text) => BusError::Transport(format!("SMTP TLS: {}", text)),
            EmailError::Protocol(text) => BusError::Protocol(text),
            EmailError::InvalidMessage(text) => BusError::Protocol(text),
            EmailError::NoRecipients => BusError::Protocol("no recipients".into()),
        }
    }
}

impl From<lapin::Error> for BusError {
    fn from(err: lapin::Error) -> Self {
        BusError::Transport(format!("AMQP: {}", err))
    }
}

impl From<ValidationError> for BusError {
    fn from(err: ValidationError) -> Self {
        BusError::Protocol(err.to_string())
    }
}

impl From<config::ConfigError> for BusError {
    fn from(err: config::ConfigError) -> Self {
        BusError::ConfigMissing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esl_errors_map_to_taxonomy() {
        assert!(matches!(
            BusError::from(EslError::Auth("-ERR invalid".into())),
            BusError::Auth(_)
        ));
        assert!(matches!(
            BusError::from(EslError::Protocol("bad".into())),
            BusError::Protocol(_)
        ));
        assert!(matches!(BusError::from(EslError::Closed), BusError::Transport(_)));
    }

    #[test]
    fn test_smtp_error_keeps_code() {
        let err = BusError::from(EmailError::Smtp {
            code: 535,
            text: "5.7.8 bad credentials".into(),
        });
        assert_eq!(err.to_string(), "SMTP error 535: 5.7.8 bad credentials");
    }

    #[test]
    fn test_missing_smtp_setting_is_config_missing() {
        let err = BusError::from(EmailError::NotConfigured("smtp_host".into()));
        assert!(matches!(err, BusError::ConfigMissing(ref v) if v == "smtp_host"));
    }

    #[test]
    fn test_sqlx_errors() {
        assert!(matches!(
            BusError::from(sqlx::Error::PoolTimedOut),
            BusError::Transport(_)
        ));
        assert!(matches!(
            BusError::from(sqlx::Error::RowNotFound),
            BusError::Query(_)
        ));
    }
}
