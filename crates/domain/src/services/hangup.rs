//! Hangup hook: missed-call email notification.
//!
//! A call the caller abandoned before it was answered ends with the
//! `ORIGINATOR_CANCEL` disposition. When the called extension asks for email
//! notification (`missed_call_app=email`), the recipients in
//! `missed_call_data` get one templated message.
//!
//! The hook runs in two pure steps around the template lookup:
//! [`missed_call`] decides whether a notification is due and what to look up,
//! [`missed_call_actions`] renders the message from the template found.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::hook::{HookAction, LogLevel, OutgoingEmail};
use crate::models::{vars, ResolvedTemplate, SessionAttributes, TemplateKey};

/// Disposition of a call abandoned by the caller.
pub const ORIGINATOR_CANCEL: &str = "ORIGINATOR_CANCEL";

/// `missed_call_app` value requesting email notification.
pub const EMAIL_APP: &str = "email";

pub const TEMPLATE_CATEGORY: &str = "missed";
pub const TEMPLATE_SUBCATEGORY: &str = "default";

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_DIALECT: &str = "us";

/// Everything needed to notify about one missed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedCall {
    pub domain_id: Option<Uuid>,
    /// `{language}-{dialect}`.
    pub language: String,
    pub recipients: String,
    pub caller_id_name: String,
    pub caller_id_number: String,
    pub sip_to_user: String,
    pub dialed_user: String,
}

impl MissedCall {
    pub fn template_key(&self) -> TemplateKey {
        TemplateKey::new(
            self.domain_id,
            self.language.clone(),
            TEMPLATE_CATEGORY,
            TEMPLATE_SUBCATEGORY,
        )
    }

    /// Values substituted into the template.
    pub fn placeholder_vars(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("caller_id_name", self.caller_id_name.clone());
        vars.insert("caller_id_number", self.caller_id_number.clone());
        vars.insert("sip_to_user", self.sip_to_user.clone());
        vars.insert("dialed_user", self.dialed_user.clone());
        vars
    }
}

/// Decides whether the hangup is a missed call that needs an email.
pub fn missed_call(session: &SessionAttributes) -> Option<MissedCall> {
    let disposition = session.get_non_empty(vars::ORIGINATE_DISPOSITION)?;
    if disposition != ORIGINATOR_CANCEL {
        return None;
    }

    if session.get(vars::MISSED_CALL_APP) != Some(EMAIL_APP) {
        return None;
    }

    let recipients = session.get_non_empty(vars::MISSED_CALL_DATA)?.to_string();

    let domain_id = session
        .get_non_empty(vars::DOMAIN_UUID)
        .and_then(|d| Uuid::parse_str(d).ok());

    let language = format!(
        "{}-{}",
        session
            .get_non_empty(vars::DEFAULT_LANGUAGE)
            .unwrap_or(DEFAULT_LANGUAGE),
        session
            .get_non_empty(vars::DEFAULT_DIALECT)
            .unwrap_or(DEFAULT_DIALECT)
    );

    let text = |name: &str| session.get(name).unwrap_or_default().to_string();

    Some(MissedCall {
        domain_id,
        language,
        recipients,
        caller_id_name: session
            .first_of(&[vars::CALLER_ID_NAME, vars::CALLER_HEADER_ID_NAME])
            .unwrap_or_default()
            .to_string(),
        caller_id_number: session
            .first_of(&[vars::CALLER_ID_NUMBER, vars::CALLER_HEADER_ID_NUMBER])
            .unwrap_or_default()
            .to_string(),
        sip_to_user: text(vars::SIP_TO_USER),
        dialed_user: text(vars::DIALED_USER),
    })
}

/// Renders the notification for `call` from the resolved template.
pub fn render_missed_call(call: &MissedCall, template: &ResolvedTemplate) -> OutgoingEmail {
    let vars = call.placeholder_vars();
    OutgoingEmail {
        recipients: call.recipients.clone(),
        subject: shared::placeholder::render(&template.subject, &vars),
        body: shared::placeholder::render(&template.body, &vars),
        template_type: template.template_type,
    }
}

/// Actions for a missed call once the template lookup finished.
///
/// Yields exactly one email when a template was found, a warning otherwise.
pub fn missed_call_actions(
    call: &MissedCall,
    template: Option<&ResolvedTemplate>,
) -> Vec<HookAction> {
    match template {
        Some(template) => vec![HookAction::SendEmail(render_missed_call(call, template))],
        None => vec![HookAction::log(
            LogLevel::Warn,
            format!(
                "no {}/{} email template for language {}",
                TEMPLATE_CATEGORY, TEMPLATE_SUBCATEGORY, call.language
            ),
        )],
    }
}
