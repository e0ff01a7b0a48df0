//! Side effects requested by switch hook handlers.
//!
//! Handlers never touch the switch or the network themselves. They return a
//! list of [`HookAction`]s which the hook adapter carries out in order.

use serde::Serialize;

use crate::models::TemplateType;

/// A fully rendered email ready for the SMTP sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    /// Recipient list exactly as configured (`,` or `;` separated).
    pub recipients: String,
    pub subject: String,
    pub body: String,
    pub template_type: TemplateType,
}

/// Severity of a [`HookAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

/// One side effect requested by a hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// Overwrite a channel variable on the live session.
    SetVariable { name: String, value: String },
    /// Submit an email through the SMTP sender.
    SendEmail(OutgoingEmail),
    Log { level: LogLevel, message: String },
}

impl HookAction {
    pub fn set_variable(name: impl Into<String>, value: impl Into<String>) -> Self {
        HookAction::SetVariable {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        HookAction::Log {
            level,
            message: message.into(),
        }
    }
}

/// Counts the emails among `actions`.
pub fn email_count(actions: &[HookAction]) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, HookAction::SendEmail(_)))
        .count()
}
