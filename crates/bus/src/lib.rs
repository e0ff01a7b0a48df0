//! DjangoPBX switch integration bus.
//!
//! Plumbing shared by the command-line tools that connect the web
//! application, the switch and the message broker:
//! - event socket client (`esl`) and AMQP consumers (`amqp`, `consumers`)
//! - settings, email and script services (`services`, `mail`)
//! - switch hook adapter (`hooks`) and presence synchroniser (`presence`)

pub mod amqp;
pub mod cli;
pub mod config;
pub mod consumers;
pub mod error;
pub mod esl;
pub mod hooks;
pub mod logging;
pub mod mail;
pub mod presence;
pub mod services;

pub use config::Config;
pub use error::{BusError, BusResult};
