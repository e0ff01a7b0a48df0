//! Call-flow presence synchroniser.
//!
//! Publishes one PRESENCE_IN event per call flow so subscribed phones show
//! the current toggle state, then leaves the event socket.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use domain::models::CallFlow;
use domain::services::presence_command;
use persistence::db::Database;
use persistence::repositories::CallFlowRepository;

use crate::error::BusResult;
use crate::esl::EslClient;

/// Enabled call flows, optionally limited to one context.
pub async fn load_call_flows(db: &Database, context: Option<&str>) -> BusResult<Vec<CallFlow>> {
    let flows = CallFlowRepository::new(db.pool().clone())
        .list(context)
        .await?;
    Ok(flows)
}

/// Sends the presence of every flow, then `exit`. Returns the number sent.
pub async fn publish_presence<S>(client: &mut EslClient<S>, flows: &[CallFlow]) -> BusResult<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    for flow in flows {
        let reply = client.command(&presence_command(flow)).await?;
        let reply_text = reply.reply_text().unwrap_or_default();
        if reply_text.starts_with("-ERR") {
            warn!(presence_id = %flow.presence_id(), reply = reply_text, "Presence rejected");
        } else {
            info!(
                presence_id = %flow.presence_id(),
                state = %flow.presence_state(),
                reply = reply_text,
                "Presence sent"
            );
        }
    }

    client.send("exit").await?;
    client.close().await;
    Ok(flows.len())
}

/// The commands [`publish_presence`] would send, for `--dry-run`.
pub fn dry_run(flows: &[CallFlow]) -> Vec<String> {
    flows.iter().map(presence_command).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::Builder;
    use uuid::Uuid;

    fn flow(feature_code: &str, status: bool) -> CallFlow {
        CallFlow {
            id: Uuid::new_v4(),
            extension: "30".to_string(),
            feature_code: feature_code.to_string(),
            status,
            context: "pbx.example.com".to_string(),
        }
    }

    fn command_bytes(flow: &CallFlow) -> Vec<u8> {
        format!("{}\n\n", presence_command(flow)).into_bytes()
    }

    #[tokio::test]
    async fn test_publishes_each_flow_then_exits() {
        let flows = vec![flow("*30", true), flow("*31", false)];
        let mock = Builder::new()
            .read(b"Content-Type: auth/request\n\n")
            .write(b"auth ClueCon\n\n")
            .read(b"Content-Type: command/reply\nReply-Text: +OK accepted\n\n")
            .write(&command_bytes(&flows[0]))
            .read(b"Content-Type: command/reply\nReply-Text: +OK 1a2b\n\n")
            .write(&command_bytes(&flows[1]))
            .read(b"Content-Type: command/reply\nReply-Text: +OK 3c4d\n\n")
            .write(b"exit\n\n")
            .build();

        let mut client = EslClient::handshake(mock, "ClueCon", Duration::from_secs(5))
            .await
            .unwrap();
        let sent = publish_presence(&mut client, &flows).await.unwrap();

        assert_eq!(sent, 2);
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_no_flows_still_exits() {
        let mock = Builder::new()
            .read(b"Content-Type: auth/request\n\n")
            .write(b"auth ClueCon\n\n")
            .read(b"Content-Type: command/reply\nReply-Text: +OK accepted\n\n")
            .write(b"exit\n\n")
            .build();

        let mut client = EslClient::handshake(mock, "ClueCon", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(publish_presence(&mut client, &[]).await.unwrap(), 0);
    }

    #[test]
    fn test_dry_run_states() {
        let commands = dry_run(&[flow("*30", true), flow("*31", false)]);
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains("from: *30@pbx.example.com"));
        assert!(commands[0].contains("answer-state: terminated"));
        assert!(!commands[0].contains("rpid"));
        assert!(commands[1].contains("answer-state: confirmed"));
        assert!(commands[1].contains("rpid: unknown"));
        assert!(commands[1].contains("event_count: 1"));
    }
}
