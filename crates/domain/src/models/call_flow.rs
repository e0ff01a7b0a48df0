//! Call-flow toggle model.

use serde::Serialize;
use uuid::Uuid;

/// A call-flow toggle as surfaced to phones through presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallFlow {
    pub id: Uuid,
    pub extension: String,
    pub feature_code: String,
    /// `status = 'true'` in the table.
    pub status: bool,
    pub context: String,
}

/// Dialog state announced for a call flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Terminated,
    Confirmed,
}

impl CallFlow {
    pub fn presence_state(&self) -> PresenceState {
        if self.status {
            PresenceState::Terminated
        } else {
            PresenceState::Confirmed
        }
    }

    /// Presence address of the toggle, `<feature_code>@<context>`.
    pub fn presence_id(&self) -> String {
        format!("{}@{}", self.feature_code, self.context)
    }
}

impl std::fmt::Display for PresenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresenceState::Terminated => write!(f, "terminated"),
            PresenceState::Confirmed => write!(f, "confirmed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(status: bool) -> CallFlow {
        CallFlow {
            id: Uuid::new_v4(),
            extension: "100".to_string(),
            feature_code: "*21".to_string(),
            status,
            context: "tenant.example".to_string(),
        }
    }

    #[test]
    fn test_presence_state() {
        assert_eq!(flow(true).presence_state(), PresenceState::Terminated);
        assert_eq!(flow(false).presence_state(), PresenceState::Confirmed);
    }

    #[test]
    fn test_presence_id() {
        assert_eq!(flow(true).presence_id(), "*21@tenant.example");
    }
}
