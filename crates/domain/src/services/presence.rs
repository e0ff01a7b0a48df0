//! PRESENCE_IN payloads for call-flow toggles.
//!
//! Phones watching a call-flow feature code see a lit or dark lamp depending
//! on the dialog state announced here.

use crate::models::{CallFlow, PresenceState};

/// Event-socket command publishing the presence of one call flow.
///
/// The result has no trailing blank line; the client appends the terminator.
pub fn presence_command(flow: &CallFlow) -> String {
    let presence_id = flow.presence_id();
    let mut lines = vec![
        "sendevent PRESENCE_IN".to_string(),
        "proto: flow".to_string(),
        "event_type: presence".to_string(),
        "alt_event_type: dialog".to_string(),
        "Presence-Call-Direction: outbound".to_string(),
        format!("from: {}", presence_id),
        format!("login: {}", presence_id),
        format!("unique-id: {}", flow.id),
    ];

    match flow.presence_state() {
        PresenceState::Terminated => {
            lines.push("answer-state: terminated".to_string());
        }
        PresenceState::Confirmed => {
            lines.push("answer-state: confirmed".to_string());
            lines.push("rpid: unknown".to_string());
            lines.push("event_count: 1".to_string());
        }
    }

    lines.join("\n")
}
