//! Firewall command planning.
//!
//! Turns a firewall event into the script invocation that applies it. Script
//! names are built from event fields, so every field is checked before it can
//! reach a path.

use std::path::{Path, PathBuf};

use serde::Serialize;
use shared::validation::{validate_ip, validate_token, ValidationError};

use crate::models::{FirewallAction, FirewallEvent};

/// Script persisting the live ruleset.
pub const SAVE_RULESET_SCRIPT: &str = "fw-save-ruleset.sh";

/// A script invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl std::fmt::Display for FirewallCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Why a firewall event produced no command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Not a `FIREWALL` event.
    NotFirewall,
    /// Missing or unsupported `Action`.
    UnknownAction(Option<String>),
}

/// What to do with a firewall event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirewallPlan {
    Run(FirewallCommand),
    Ignore(Skip),
}

/// Plans the command for `event`.
///
/// `Err` means the event is a firewall event with unusable fields.
pub fn plan_command(
    event: &FirewallEvent,
    script_dir: &Path,
) -> Result<FirewallPlan, ValidationError> {
    if !event.is_firewall() {
        return Ok(FirewallPlan::Ignore(Skip::NotFirewall));
    }

    let Some(action) = event.action.as_deref().and_then(FirewallAction::parse) else {
        return Ok(FirewallPlan::Ignore(Skip::UnknownAction(event.action.clone())));
    };

    match action {
        FirewallAction::Add | FirewallAction::Delete => {
            let ip_type = event.ip_type();
            let fw_list = event.fw_list();
            validate_token("IP-Type", ip_type)?;
            validate_token("Fw-List", fw_list)?;
            let ip = validate_ip(ip_type, event.ip_address())?;

            Ok(FirewallPlan::Run(FirewallCommand {
                program: script_dir.join(format!(
                    "fw-{}-{}-{}-list.sh",
                    action.as_str(),
                    ip_type,
                    fw_list
                )),
                args: vec![ip.to_string()],
            }))
        }
        FirewallAction::Save => Ok(FirewallPlan::Run(FirewallCommand {
            program: script_dir.join(SAVE_RULESET_SCRIPT),
            args: Vec::new(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIR: &str = "/usr/local/bin";

    fn event(json: &str) -> FirewallEvent {
        serde_json::from_str(json).unwrap()
    }

    fn planned(json: &str) -> FirewallCommand {
        match plan_command(&event(json), Path::new(DIR)).unwrap() {
            FirewallPlan::Run(command) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn test_add_command() {
        let command = planned(
            r#"{"Event-Name":"FIREWALL","Action":"add","IP-Type":"ipv4","Fw-List":"sip-customer","IP-Address":"203.0.113.9"}"#,
        );
        assert_eq!(
            command.program,
            PathBuf::from("/usr/local/bin/fw-add-ipv4-sip-customer-list.sh")
        );
        assert_eq!(command.args, vec!["203.0.113.9".to_string()]);
        assert_eq!(
            command.to_string(),
            "/usr/local/bin/fw-add-ipv4-sip-customer-list.sh 203.0.113.9"
        );
    }

    #[test]
    fn test_delete_with_defaults() {
        let command = planned(r#"{"Event-Name":"FIREWALL","Action":"delete"}"#);
        assert_eq!(
            command.to_string(),
            "/usr/local/bin/fw-delete-ipv4-sip-customer-list.sh 192.168.42.1"
        );
    }

    #[test]
    fn test_ipv6_add() {
        let command = planned(
            r#"{"Event-Name":"FIREWALL","Action":"add","IP-Type":"ipv6","Fw-List":"block","IP-Address":"2001:db8::1"}"#,
        );
        assert_eq!(
            command.to_string(),
            "/usr/local/bin/fw-add-ipv6-block-list.sh 2001:db8::1"
        );
    }

    #[test]
    fn test_save_command() {
        let command =
            planned(r#"{"Event-Name":"FIREWALL","Action":"save","IP-Address":"ignored"}"#);
        assert_eq!(command.program, PathBuf::from("/usr/local/bin/fw-save-ruleset.sh"));
        assert!(command.args.is_empty());
    }

    #[test]
    fn test_non_firewall_events_are_skipped() {
        let result = plan_command(
            &event(r#"{"Event-Name":"CUSTOM","Action":"add"}"#),
            Path::new(DIR),
        )
        .unwrap();
        assert_eq!(result, FirewallPlan::Ignore(Skip::NotFirewall));
    }

    #[test]
    fn test_unknown_action_is_skipped() {
        let result = plan_command(
            &event(r#"{"Event-Name":"FIREWALL","Action":"flush"}"#),
            Path::new(DIR),
        )
        .unwrap();
        assert_eq!(
            result,
            FirewallPlan::Ignore(Skip::UnknownAction(Some("flush".to_string())))
        );

        let result =
            plan_command(&event(r#"{"Event-Name":"FIREWALL"}"#), Path::new(DIR)).unwrap();
        assert_eq!(result, FirewallPlan::Ignore(Skip::UnknownAction(None)));
    }

    #[test]
    fn test_unsafe_fields_are_rejected() {
        assert!(plan_command(
            &event(r#"{"Event-Name":"FIREWALL","Action":"add","Fw-List":"../../tmp/x"}"#),
            Path::new(DIR),
        )
        .is_err());
        assert!(plan_command(
            &event(r#"{"Event-Name":"FIREWALL","Action":"add","IP-Address":"1.2.3.4; reboot"}"#),
            Path::new(DIR),
        )
        .is_err());
        assert!(plan_command(
            &event(r#"{"Event-Name":"FIREWALL","Action":"add","IP-Type":"ipv6","IP-Address":"10.0.0.1"}"#),
            Path::new(DIR),
        )
        .is_err());
    }
}
