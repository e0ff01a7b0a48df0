//! Applies firewall changes published on `TAP.Firewall`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use djangopbx_bus::amqp::{shutdown_signal, AmqpConnection};
use djangopbx_bus::cli::BrokerArgs;
use djangopbx_bus::consumers::{firewall_reactor, FirewallReactor};
use djangopbx_bus::logging::{init_logging, LogFormat};
use djangopbx_bus::services::ProcessScriptRunner;
use djangopbx_bus::Config;

#[derive(Debug, Parser)]
#[command(name = "fw-remote-event", version, about = "Apply firewall events from the broker")]
struct Cli {
    #[command(flatten)]
    broker: BrokerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.broker.apply(&mut config.broker);
    init_logging(&config.logging, LogFormat::Full);

    let spec = firewall_reactor::queue_spec();
    let connection = AmqpConnection::connect(&config.broker).await?;
    connection
        .setup_exchange(firewall_reactor::EXCHANGE, spec.durable)
        .await?;
    connection.setup_queues(&spec).await?;

    let reactor = FirewallReactor::new(
        config.firewall.script_dir.clone(),
        Arc::new(ProcessScriptRunner),
    );
    info!(script_dir = %config.firewall.script_dir, "Firewall reactor started");
    connection
        .consume(&spec.queue, &reactor, shutdown_signal())
        .await?;

    connection.close().await?;
    info!("Firewall reactor stopped");
    Ok(())
}
