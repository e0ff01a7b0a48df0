//! Command-line arguments shared by the tools.

use clap::Args;

use crate::config::BrokerConfig;

/// Broker connection flags. Unset flags keep the configured values.
#[derive(Debug, Clone, Default, Args)]
pub struct BrokerArgs {
    /// Broker host
    #[arg(long)]
    pub host: Option<String>,

    /// Broker port
    #[arg(long)]
    pub port: Option<u16>,

    /// Broker user name
    #[arg(long)]
    pub user: Option<String>,

    /// Broker password
    #[arg(long)]
    pub password: Option<String>,
}

impl BrokerArgs {
    pub fn apply(&self, broker: &mut BrokerConfig) {
        if let Some(host) = &self.host {
            broker.host = host.clone();
        }
        if let Some(port) = self.port {
            broker.port = port;
        }
        if let Some(user) = &self.user {
            broker.user = user.clone();
        }
        if let Some(password) = &self.password {
            broker.password = password.clone();
        }
    }
}
