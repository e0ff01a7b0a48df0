//! Event socket (ESL) client for the switch's control protocol.

pub mod client;
pub mod codec;

pub use client::EslClient;
pub use codec::{EslCodec, Frame};

use thiserror::Error;

/// Default inbound event socket port.
pub const DEFAULT_PORT: u16 = 8021;

/// Factory default event socket password.
pub const DEFAULT_PASSWORD: &str = "ClueCon";

#[derive(Debug, Error)]
pub enum EslError {
    #[error("event socket I/O error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("event socket authentication rejected: {0}")]
    Auth(String),

    #[error("event socket protocol error: {0}")]
    Protocol(String),

    #[error("event socket connection closed")]
    Closed,
}
