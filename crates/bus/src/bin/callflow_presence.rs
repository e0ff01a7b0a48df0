//! Publishes the presence of every call-flow toggle to the switch.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use djangopbx_bus::esl::EslClient;
use djangopbx_bus::logging::{init_logging, LogFormat};
use djangopbx_bus::presence::{dry_run, load_call_flows, publish_presence};
use djangopbx_bus::Config;
use persistence::db::Database;

#[derive(Debug, Parser)]
#[command(name = "callflow-presence", version, about = "Sync call-flow presence to the switch")]
struct Cli {
    /// Only call flows in this context (domain name)
    #[arg(long)]
    domain: Option<String>,

    /// Print the events instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    init_logging(&config.logging, LogFormat::Compact);

    let db = Database::connect(&config.database.pool_config()).await?;
    let flows = load_call_flows(&db, cli.domain.as_deref()).await;
    db.close().await;
    let flows = flows?;

    if cli.dry_run {
        for command in dry_run(&flows) {
            println!("{}\n", command);
        }
        return Ok(());
    }

    let mut client = EslClient::connect(&config.event_socket).await?;
    let sent = publish_presence(&mut client, &flows).await?;
    info!(sent, "Call-flow presence synchronised");
    Ok(())
}
