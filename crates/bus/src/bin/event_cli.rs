//! Prints switch events published on `TAP.Events`.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use djangopbx_bus::amqp::{shutdown_signal, AmqpConnection};
use djangopbx_bus::cli::BrokerArgs;
use djangopbx_bus::consumers::{event_cli, EventPrinter};
use djangopbx_bus::logging::{init_logging, LogFormat};
use djangopbx_bus::Config;

#[derive(Debug, Parser)]
#[command(name = "event-cli", version, about = "Print switch events from the broker")]
struct Cli {
    #[command(flatten)]
    broker: BrokerArgs,

    /// Only print events with this Event-Name
    #[arg(long = "event")]
    event: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.broker.apply(&mut config.broker);
    init_logging(&config.logging, LogFormat::Full);

    let spec = event_cli::queue_spec();
    let connection = AmqpConnection::connect(&config.broker).await?;
    connection.setup_queues(&spec).await?;

    let printer = EventPrinter::new(std::io::stdout(), cli.event);
    connection
        .consume(&spec.queue, &printer, shutdown_signal())
        .await?;

    connection.close().await?;
    info!("Event CLI stopped");
    Ok(())
}
