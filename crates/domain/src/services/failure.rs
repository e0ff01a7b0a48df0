//! Bridge failure hook.
//!
//! Runs after a bridge attempt failed. It normalises the failure cause so that
//! a busy callee is always reported as `USER_BUSY`, whatever the far end sent,
//! and dispatches on the resulting disposition.

use serde::Serialize;

use super::hook::{HookAction, LogLevel};
use crate::models::{vars, SessionAttributes};

/// Originate cause marking a busy callee.
pub const USER_BUSY: &str = "USER_BUSY";

/// SIP-level hangup cause for "486 Busy Here".
pub const SIP_BUSY_HERE: &str = "sip:486";

/// Outcome of a failed bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Disposition {
    UserBusy,
    NoAnswer,
    UserNotRegistered,
    SubscriberAbsent,
    CallRejected,
    Other(String),
}

impl Disposition {
    pub fn parse(value: &str) -> Self {
        match value {
            "USER_BUSY" => Disposition::UserBusy,
            "NO_ANSWER" => Disposition::NoAnswer,
            "USER_NOT_REGISTERED" => Disposition::UserNotRegistered,
            "SUBSCRIBER_ABSENT" => Disposition::SubscriberAbsent,
            "CALL_REJECTED" => Disposition::CallRejected,
            other => Disposition::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::UserBusy => write!(f, "USER_BUSY"),
            Disposition::NoAnswer => write!(f, "NO_ANSWER"),
            Disposition::UserNotRegistered => write!(f, "USER_NOT_REGISTERED"),
            Disposition::SubscriberAbsent => write!(f, "SUBSCRIBER_ABSENT"),
            Disposition::CallRejected => write!(f, "CALL_REJECTED"),
            Disposition::Other(s) => write!(f, "{}", s),
        }
    }
}

/// What the failure hook decided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureOutcome {
    /// Caller name after the local-call rewrite.
    pub caller_id_name: Option<String>,
    pub disposition: Option<Disposition>,
    pub actions: Vec<HookAction>,
}

/// Whether the attempt should be reported as busy.
pub fn is_busy(originate_causes: Option<&str>, hangup_cause: Option<&str>) -> bool {
    originate_causes.is_some_and(|c| c.contains(USER_BUSY)) || hangup_cause == Some(SIP_BUSY_HERE)
}

/// Handles a failed bridge. `None` means there is no active session.
pub fn handle_failure(session: Option<&SessionAttributes>) -> FailureOutcome {
    let Some(session) = session else {
        return FailureOutcome::default();
    };

    let mut outcome = FailureOutcome {
        caller_id_name: session.get(vars::CALLER_ID_NAME).map(String::from),
        ..Default::default()
    };

    if session.get(vars::CALL_DIRECTION) == Some("local") {
        outcome.caller_id_name = session
            .get(vars::EFFECTIVE_CALLER_ID_NAME)
            .map(String::from);
    }

    let mut disposition = session
        .get_non_empty(vars::ORIGINATE_DISPOSITION)
        .map(String::from);

    if is_busy(
        session.get(vars::ORIGINATE_CAUSES),
        session.get(vars::LAST_BRIDGE_HANGUP_CAUSE),
    ) {
        disposition = Some(USER_BUSY.to_string());
        outcome
            .actions
            .push(HookAction::set_variable(vars::ORIGINATE_DISPOSITION, USER_BUSY));
    }

    let Some(disposition) = disposition.map(|d| Disposition::parse(&d)) else {
        return outcome;
    };

    outcome.actions.extend(follow_up(&disposition));
    outcome.disposition = Some(disposition);
    outcome
}

/// Follow-up actions per disposition.
///
/// None of the known dispositions triggers anything yet; each keeps its own
/// arm so routing policy can be attached per case.
pub fn follow_up(disposition: &Disposition) -> Vec<HookAction> {
    match disposition {
        Disposition::UserBusy => Vec::new(),
        Disposition::NoAnswer => Vec::new(),
        Disposition::UserNotRegistered => Vec::new(),
        Disposition::SubscriberAbsent => Vec::new(),
        Disposition::CallRejected => Vec::new(),
        Disposition::Other(value) => vec![HookAction::log(
            LogLevel::Debug,
            format!("no failure handling for disposition {}", value),
        )],
    }
}
