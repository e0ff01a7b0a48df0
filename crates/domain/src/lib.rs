//! Domain layer for the DjangoPBX switch integration bus.
//!
//! This crate contains:
//! - Domain models (settings, email templates, call flows, switch events)
//! - Pure business logic: settings resolution, switch hook handlers,
//!   presence payloads and firewall command planning
//!
//! Nothing in here performs I/O; the `bus` crate executes what these
//! functions decide.

pub mod models;
pub mod services;
