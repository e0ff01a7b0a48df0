//! Entry point the switch runs for bridge failures and hangups.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use djangopbx_bus::esl::EslClient;
use djangopbx_bus::hooks::{HookKind, HookReport, HookRunner};
use djangopbx_bus::logging::{init_logging, LogFormat};
use djangopbx_bus::services::{EmailService, SettingsService, SmtpMailer};
use djangopbx_bus::{BusResult, Config};
use persistence::db::Database;

#[derive(Debug, Parser)]
#[command(name = "switch-hook", version, about = "Run a call hook for a switch channel")]
struct Cli {
    /// Hook to run
    #[arg(value_enum)]
    kind: HookKind,

    /// Channel UUID
    uuid: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    init_logging(&config.logging, LogFormat::Compact);

    let db = Database::connect(&config.database.pool_config()).await?;
    let email = EmailService::new(SettingsService::from_database(&db), Arc::new(SmtpMailer));
    let runner = HookRunner::new(email);

    let result = run_hook(&runner, &config, &cli).await;
    db.close().await;

    let report = result?;
    info!(
        kind = ?cli.kind,
        uuid = %cli.uuid,
        session_found = report.session_found,
        variables_set = report.variables_set,
        emails_sent = report.emails_sent,
        "Hook finished"
    );
    Ok(())
}

async fn run_hook(runner: &HookRunner, config: &Config, cli: &Cli) -> BusResult<HookReport> {
    let mut client = EslClient::connect(&config.event_socket).await?;
    let report = runner.run(cli.kind, &mut client, &cli.uuid).await;
    client.close().await;
    report
}
