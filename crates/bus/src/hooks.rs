//! Switch hook adapter.
//!
//! The switch runs `switch-hook <failure|hangup> <uuid>` from the dialplan.
//! The adapter pulls the channel's attributes over the event socket, hands
//! them to the pure handler and carries out the actions it returns.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};
use uuid::Uuid;

use domain::models::SessionAttributes;
use domain::services::{handle_failure, missed_call, missed_call_actions, HookAction, LogLevel};
use shared::validation::validate_token;

use crate::error::{BusError, BusResult};
use crate::esl::EslClient;
use crate::services::EmailService;

/// Prefix the switch puts on channel variables in a dump.
const VARIABLE_PREFIX: &str = "variable_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HookKind {
    /// A bridge attempt failed.
    Failure,
    /// The call ended.
    Hangup,
}

/// What one hook run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    pub session_found: bool,
    pub variables_set: usize,
    pub emails_sent: usize,
}

/// Fetches the attributes of channel `uuid`. `None` when it no longer exists.
pub async fn fetch_session<S>(
    client: &mut EslClient<S>,
    uuid: &str,
) -> BusResult<Option<SessionAttributes>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    validate_token("uuid", uuid)?;
    let body = client.api(&format!("uuid_dump {} json", uuid)).await?;
    if body.trim_start().starts_with("-ERR") {
        debug!(uuid, reply = %body.trim(), "No active session");
        return Ok(None);
    }
    parse_session_dump(&body).map(Some)
}

/// Builds the attribute bag from a `uuid_dump ... json` body.
///
/// Channel variables lose their `variable_` prefix and take precedence over
/// channel headers of the same name.
pub fn parse_session_dump(body: &str) -> BusResult<SessionAttributes> {
    let dump: Value = serde_json::from_str(body)
        .map_err(|e| BusError::Protocol(format!("session dump is not JSON: {}", e)))?;
    let Value::Object(fields) = dump else {
        return Err(BusError::Protocol("session dump is not a JSON object".to_string()));
    };

    let mut session = SessionAttributes::new();
    let mut variables = Vec::new();
    for (name, value) in fields {
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        match name.strip_prefix(VARIABLE_PREFIX) {
            Some(variable) => variables.push((variable.to_string(), value)),
            None => session.set(name, value),
        }
    }
    for (name, value) in variables {
        session.set(name, value);
    }
    Ok(session)
}

/// Runs hooks against the switch and the mail relay.
#[derive(Clone)]
pub struct HookRunner {
    email: EmailService,
}

impl HookRunner {
    pub fn new(email: EmailService) -> Self {
        Self { email }
    }

    pub async fn run<S>(
        &self,
        kind: HookKind,
        client: &mut EslClient<S>,
        uuid: &str,
    ) -> BusResult<HookReport>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let session = fetch_session(client, uuid).await?;
        let mut report = HookReport {
            session_found: session.is_some(),
            ..Default::default()
        };

        let mut domain_id: Option<Uuid> = None;
        let actions = match (kind, session) {
            (HookKind::Failure, session) => {
                let outcome = handle_failure(session.as_ref());
                if let Some(disposition) = &outcome.disposition {
                    info!(uuid, disposition = %disposition, caller_id_name = ?outcome.caller_id_name, "Bridge failure");
                }
                outcome.actions
            }
            (HookKind::Hangup, Some(session)) => match missed_call(&session) {
                Some(call) => {
                    domain_id = call.domain_id;
                    let template = self
                        .email
                        .settings()
                        .email_template(&call.template_key())
                        .await?;
                    missed_call_actions(&call, template.as_ref())
                }
                None => Vec::new(),
            },
            (HookKind::Hangup, None) => Vec::new(),
        };

        for action in actions {
            match action {
                HookAction::SetVariable { name, value } => {
                    set_variable(client, uuid, &name, &value).await?;
                    report.variables_set += 1;
                }
                HookAction::SendEmail(email) => {
                    self.email.send(domain_id, &email).await?;
                    report.emails_sent += 1;
                    info!(uuid, recipients = %email.recipients, "Missed call notification sent");
                }
                HookAction::Log { level, message } => match level {
                    LogLevel::Debug => debug!(uuid, "{}", message),
                    LogLevel::Info => info!(uuid, "{}", message),
                    LogLevel::Warn => warn!(uuid, "{}", message),
                },
            }
        }

        Ok(report)
    }
}

async fn set_variable<S>(
    client: &mut EslClient<S>,
    uuid: &str,
    name: &str,
    value: &str,
) -> BusResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = client
        .api(&format!("uuid_setvar {} {} {}", uuid, name, value))
        .await?;
    if reply.trim_start().starts_with("-ERR") {
        return Err(BusError::Protocol(format!(
            "uuid_setvar {} failed: {}",
            name,
            reply.trim()
        )));
    }
    debug!(uuid, name, value, "Channel variable set");
    Ok(())
}
