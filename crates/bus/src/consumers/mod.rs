//! Broker consumers.

pub mod event_cli;
pub mod firewall_reactor;

pub use event_cli::{render_event, EventPrinter};
pub use firewall_reactor::FirewallReactor;
