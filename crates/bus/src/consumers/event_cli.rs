//! Event CLI: dumps switch events from the broker to a terminal.

use std::io::Write;
use std::sync::Mutex;

use serde_json::Value;
use tracing::debug;

use crate::amqp::{host_queue_name, DeliveryHandler, InboundMessage, QueueSpec, ALL_EVENTS};
use crate::error::{BusError, BusResult};

pub const EXCHANGE: &str = "TAP.Events";
pub const QUEUE_SUFFIX: &str = "cli_event_queue";

/// Durable per-host queue bound to every event routing key.
pub fn queue_spec() -> QueueSpec {
    QueueSpec::new(host_queue_name(QUEUE_SUFFIX), true, EXCHANGE, &[ALL_EVENTS])
}

/// Formats one event payload for display.
///
/// `Ok(None)` means the event does not match `filter`.
pub fn render_event(body: &[u8], filter: Option<&str>) -> BusResult<Option<String>> {
    let event: Value = serde_json::from_slice(body)
        .map_err(|e| BusError::Protocol(format!("payload is not JSON: {}", e)))?;
    let Some(fields) = event.as_object() else {
        return Err(BusError::Protocol("payload is not a JSON object".to_string()));
    };

    let name = fields.get("Event-Name").and_then(Value::as_str);
    if let Some(wanted) = filter {
        if name != Some(wanted) {
            return Ok(None);
        }
    }

    let mut out = format!("Event-Name: {}\n", name.unwrap_or("(none)"));
    if let Some(subclass) = fields
        .get("Event-Subclass")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        out.push_str(&format!("Event-Subclass: {}\n", subclass));
    }
    let pretty = serde_json::to_string_pretty(&event)
        .map_err(|e| BusError::Protocol(e.to_string()))?;
    out.push_str(&pretty);
    out.push('\n');
    Ok(Some(out))
}

/// Prints matching events to `out`.
pub struct EventPrinter<W> {
    filter: Option<String>,
    out: Mutex<W>,
}

impl<W: Write + Send> EventPrinter<W> {
    pub fn new(out: W, filter: Option<String>) -> Self {
        Self {
            filter,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn print(&self, text: &str) -> BusResult<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| BusError::Transport("output lock poisoned".to_string()))?;
        out.write_all(text.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .and_then(|_| out.flush())
            .map_err(|e| BusError::Transport(format!("writing event: {}", e)))
    }
}

#[async_trait::async_trait]
impl<W: Write + Send + 'static> DeliveryHandler for EventPrinter<W> {
    async fn handle(&self, message: InboundMessage) -> BusResult<()> {
        match render_event(&message.body, self.filter.as_deref())? {
            Some(text) => self.print(&text),
            None => {
                debug!(routing_key = %message.routing_key, "Event filtered out");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::BasicProperties;

    const HEARTBEAT: &[u8] = br#"{"Event-Name":"HEARTBEAT","Core-UUID":"abc"}"#;
    const CUSTOM: &[u8] =
        br#"{"Event-Name":"CUSTOM","Event-Subclass":"sofia::register","from-user":"101"}"#;

    fn message(body: &[u8]) -> InboundMessage {
        InboundMessage {
            exchange: EXCHANGE.to_string(),
            routing_key: "FreeSWITCH.pbx1.HEARTBEAT.none.none".to_string(),
            properties: BasicProperties::default(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_render_name_then_payload() {
        let text = render_event(HEARTBEAT, None).unwrap().unwrap();
        assert!(text.starts_with("Event-Name: HEARTBEAT\n{"));
        assert!(text.contains("\"Core-UUID\": \"abc\""));
        assert!(!text.contains("Event-Subclass"));
    }

    #[test]
    fn test_render_includes_subclass() {
        let text = render_event(CUSTOM, None).unwrap().unwrap();
        assert!(text.starts_with("Event-Name: CUSTOM\nEvent-Subclass: sofia::register\n"));
    }

    #[test]
    fn test_filter() {
        assert!(render_event(HEARTBEAT, Some("CUSTOM")).unwrap().is_none());
        assert!(render_event(CUSTOM, Some("CUSTOM")).unwrap().is_some());
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(render_event(b"[]", None).is_err());
        assert!(render_event(b"garbage", None).is_err());
    }

    #[tokio::test]
    async fn test_printer_writes_matching_events() {
        let printer = EventPrinter::new(Vec::new(), Some("CUSTOM".to_string()));
        printer.handle(message(HEARTBEAT)).await.unwrap();
        printer.handle(message(CUSTOM)).await.unwrap();

        let out = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(out.matches("Event-Name:").count(), 1);
        assert!(out.contains("sofia::register"));
    }

    #[test]
    fn test_queue_is_durable() {
        let spec = queue_spec();
        assert!(spec.durable);
        assert!(spec.queue.ends_with("_cli_event_queue"));
    }
}
