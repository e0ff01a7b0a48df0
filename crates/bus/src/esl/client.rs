//! Inbound event socket client.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use super::codec::{EslCodec, Frame};
use super::EslError;
use crate::config::EventSocketConfig;

/// Reply text the switch sends after a successful `auth`.
pub const AUTH_ACCEPTED: &str = "+OK accepted";

/// An authenticated event socket connection.
///
/// Generic over the transport so tests can drive it with in-memory streams.
pub struct EslClient<S = TcpStream> {
    framed: Option<Framed<S, EslCodec>>,
    read_timeout: Duration,
}

impl EslClient<TcpStream> {
    /// Opens a TCP connection and authenticates.
    pub async fn connect(config: &EventSocketConfig) -> Result<Self, EslError> {
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        debug!(host = %config.host, port = config.port, "Event socket connected");
        Self::handshake(stream, &config.password, config.read_timeout()).await
    }
}

impl<S> EslClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs the `auth/request` exchange over an already open stream.
    pub async fn handshake(
        stream: S,
        password: &str,
        read_timeout: Duration,
    ) -> Result<Self, EslError> {
        let mut client = Self {
            framed: Some(Framed::new(stream, EslCodec::new())),
            read_timeout,
        };

        let greeting = client.read().await?;
        if greeting.content_type() != Some("auth/request") {
            return Err(EslError::Protocol(format!(
                "expected auth/request greeting, got {:?}",
                greeting.content_type()
            )));
        }

        client.send(&format!("auth {}", password)).await?;
        let reply = client.read().await?;
        match reply.reply_text() {
            Some(AUTH_ACCEPTED) => {
                info!("Event socket authenticated");
                Ok(client)
            }
            other => Err(EslError::Auth(other.unwrap_or("no Reply-Text").to_string())),
        }
    }

    /// Writes `command` followed by the blank line terminator.
    pub async fn send(&mut self, command: &str) -> Result<(), EslError> {
        let framed = self.framed.as_mut().ok_or(EslError::Closed)?;
        framed.send(command).await
    }

    /// Reads the next frame, failing if none arrives within the read timeout.
    pub async fn read(&mut self) -> Result<Frame, EslError> {
        let timeout = self.read_timeout;
        let framed = self.framed.as_mut().ok_or(EslError::Closed)?;
        match tokio::time::timeout(timeout, framed.next()).await {
            Err(_) => Err(EslError::Protocol(format!(
                "no complete frame within {} ms",
                timeout.as_millis()
            ))),
            Ok(None) => Err(EslError::Closed),
            Ok(Some(frame)) => frame,
        }
    }

    /// Sends a command and returns its `command/reply` frame.
    pub async fn command(&mut self, command: &str) -> Result<Frame, EslError> {
        self.send(command).await?;
        loop {
            let frame = self.read().await?;
            if frame.content_type() == Some("command/reply") {
                return Ok(frame);
            }
            debug!(content_type = ?frame.content_type(), "Skipping unrelated frame");
        }
    }

    /// Runs `api <command>` and returns the response body.
    pub async fn api(&mut self, command: &str) -> Result<String, EslError> {
        self.send(&format!("api {}", command)).await?;
        loop {
            let frame = self.read().await?;
            if frame.content_type() == Some("api/response") {
                return Ok(frame.body);
            }
            debug!(content_type = ?frame.content_type(), "Skipping unrelated frame");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.framed.is_none()
    }

    /// Shuts the connection down. Calling it again does nothing.
    pub async fn close(&mut self) {
        if let Some(framed) = self.framed.take() {
            let mut stream = framed.into_inner();
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Event socket shutdown failed");
            }
        }
    }
}
