//! Firewall reactor: applies firewall events published by the web application.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use domain::models::FirewallEvent;
use domain::services::{plan_command, FirewallCommand, FirewallPlan};

use crate::amqp::{host_queue_name, DeliveryHandler, InboundMessage, QueueSpec, ALL_EVENTS};
use crate::error::{BusError, BusResult};
use crate::services::ScriptRunner;

pub const EXCHANGE: &str = "TAP.Firewall";
pub const QUEUE_SUFFIX: &str = "remote_event_queue";

/// Non-durable per-host queue bound to every firewall routing key.
pub fn queue_spec() -> QueueSpec {
    QueueSpec::new(host_queue_name(QUEUE_SUFFIX), false, EXCHANGE, &[ALL_EVENTS])
}

pub struct FirewallReactor {
    script_dir: PathBuf,
    runner: Arc<dyn ScriptRunner>,
}

impl FirewallReactor {
    pub fn new(script_dir: impl Into<PathBuf>, runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            script_dir: script_dir.into(),
            runner,
        }
    }

    /// Runs the script for one payload. Returns the command that ran, if any.
    pub async fn react(&self, body: &[u8]) -> BusResult<Option<FirewallCommand>> {
        let text = std::str::from_utf8(body)
            .map_err(|e| BusError::Protocol(format!("payload is not UTF-8: {}", e)))?;
        let event: FirewallEvent = serde_json::from_str(text)
            .map_err(|e| BusError::Protocol(format!("payload is not a JSON object: {}", e)))?;

        match plan_command(&event, &self.script_dir)? {
            FirewallPlan::Run(command) => {
                self.runner.run(&command).await?;
                info!(command = %command, "Firewall script completed");
                Ok(Some(command))
            }
            FirewallPlan::Ignore(skip) => {
                debug!(reason = ?skip, "Event ignored");
                Ok(None)
            }
        }
    }
}

#[async_trait::async_trait]
impl DeliveryHandler for FirewallReactor {
    async fn handle(&self, message: InboundMessage) -> BusResult<()> {
        debug!(routing_key = %message.routing_key, bytes = message.body.len(), "Firewall event received");
        self.react(&message.body).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockScriptRunner;
    use std::path::Path;

    fn reactor(runner: Arc<MockScriptRunner>) -> FirewallReactor {
        FirewallReactor::new("/usr/local/bin", runner)
    }

    #[tokio::test]
    async fn test_add_runs_list_script() {
        let runner = Arc::new(MockScriptRunner::new());
        let command = reactor(runner.clone())
            .react(br#"{"Event-Name":"FIREWALL","Action":"add","IP-Type":"ipv4","Fw-List":"block","IP-Address":"203.0.113.9"}"#)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            command.program,
            Path::new("/usr/local/bin/fw-add-ipv4-block-list.sh")
        );
        assert_eq!(command.args, vec!["203.0.113.9"]);
        assert_eq!(runner.runs(), vec![command]);
    }

    #[tokio::test]
    async fn test_delete_uses_defaults() {
        let runner = Arc::new(MockScriptRunner::new());
        reactor(runner.clone())
            .react(br#"{"Event-Name":"FIREWALL","Action":"delete"}"#)
            .await
            .unwrap();

        let runs = runner.runs();
        assert_eq!(
            runs[0].program,
            Path::new("/usr/local/bin/fw-delete-ipv4-sip-customer-list.sh")
        );
        assert_eq!(runs[0].args, vec!["192.168.42.1"]);
    }

    #[tokio::test]
    async fn test_each_save_runs_once() {
        let runner = Arc::new(MockScriptRunner::new());
        let reactor = reactor(runner.clone());
        for _ in 0..3 {
            reactor
                .react(br#"{"Event-Name":"FIREWALL","Action":"save"}"#)
                .await
                .unwrap();
        }

        let runs = runner.runs();
        assert_eq!(runs.len(), 3);
        assert!(runs
            .iter()
            .all(|c| c.program == Path::new("/usr/local/bin/fw-save-ruleset.sh") && c.args.is_empty()));
    }

    #[tokio::test]
    async fn test_other_events_never_run_scripts() {
        let runner = Arc::new(MockScriptRunner::new());
        let reactor = reactor(runner.clone());

        let ignored = reactor
            .react(br#"{"Event-Name":"HEARTBEAT","Action":"save"}"#)
            .await
            .unwrap();
        assert!(ignored.is_none());
        assert!(reactor
            .react(br#"{"Event-Name":"FIREWALL","Action":"flush"}"#)
            .await
            .unwrap()
            .is_none());
        assert!(runner.runs().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payloads_are_protocol_errors() {
        let runner = Arc::new(MockScriptRunner::new());
        let reactor = reactor(runner.clone());

        for body in [
            &b"\xff\xfe"[..],
            &b"not json"[..],
            &b"[1,2]"[..],
            &br#"{"Event-Name":"FIREWALL","Action":"add","IP-Type":"ipv4","Fw-List":"../x","IP-Address":"1.2.3.4"}"#[..],
            &br#"{"Event-Name":"FIREWALL","Action":"add","IP-Type":"ipv4","Fw-List":"block","IP-Address":"1.2.3.4; rm -rf /"}"#[..],
        ] {
            let err = reactor.react(body).await.unwrap_err();
            assert!(matches!(err, BusError::Protocol(_)), "{:?}", err);
        }
        assert!(runner.runs().is_empty());
    }

    #[tokio::test]
    async fn test_script_failure_surfaces() {
        let runner = Arc::new(MockScriptRunner::failing());
        let err = reactor(runner)
            .react(br#"{"Event-Name":"FIREWALL","Action":"save"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::ExternalScript { .. }));
    }

    #[test]
    fn test_queue_is_not_durable() {
        let spec = queue_spec();
        assert!(!spec.durable);
        assert!(spec.queue.ends_with("_remote_event_queue"));
        assert_eq!(spec.routing[EXCHANGE], vec![ALL_EVENTS]);
    }
}
