//! Sendmail replacement relaying a message from stdin through the PBX's
//! SMTP settings.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::debug;

use djangopbx_bus::logging::{init_logging, LogFormat};
use djangopbx_bus::mail::decode_input;
use djangopbx_bus::services::{EmailService, SettingsService, SmtpMailer};
use djangopbx_bus::Config;
use persistence::db::Database;

#[derive(Debug, Parser)]
#[command(name = "sendmail", version, about = "Relay a message read from stdin")]
struct Cli {
    /// Read recipients from the To, Cc and Bcc headers
    #[arg(short = 't')]
    extract_recipients: bool,

    /// Envelope sender (replaced by the configured smtp_from)
    #[arg(short = 'f')]
    sender: Option<String>,

    /// Do not treat a line with a single dot as end of input
    #[arg(short = 'i')]
    ignore_dots: bool,

    /// MTA option such as `-oi` or `-oem`; only `i` has an effect
    #[arg(short = 'o', value_name = "OPTION")]
    options: Vec<String>,

    /// Sender full name (ignored)
    #[arg(short = 'F', value_name = "NAME")]
    full_name: Option<String>,

    /// Body type such as `8BITMIME` (ignored)
    #[arg(short = 'B', value_name = "TYPE")]
    body_type: Option<String>,

    /// Recipients
    recipients: Vec<String>,
}

impl Cli {
    /// `-i` and `-oi` are equivalent.
    fn ignore_dots(&self) -> bool {
        self.ignore_dots || self.options.iter().any(|o| o == "i")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load()?;
    init_logging(&config.logging, LogFormat::Compact);
    debug!(
        sender = ?cli.sender,
        full_name = ?cli.full_name,
        body_type = ?cli.body_type,
        options = ?cli.options,
        "Ignoring sender options"
    );

    let mut raw = Vec::new();
    tokio::io::stdin().read_to_end(&mut raw).await?;
    let raw = decode_input(&raw, !cli.ignore_dots());

    let db = Database::connect(&config.database.pool_config()).await?;
    let email = EmailService::new(SettingsService::from_database(&db), Arc::new(SmtpMailer));
    let result = email
        .sendmail(&raw, &cli.recipients, cli.extract_recipients)
        .await;
    db.close().await;

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_style_flags_are_accepted() {
        let cli =
            Cli::try_parse_from(["sendmail", "-FCronDaemon", "-i", "-B8BITMIME", "-oem", "root"])
                .unwrap();

        assert_eq!(cli.full_name.as_deref(), Some("CronDaemon"));
        assert_eq!(cli.body_type.as_deref(), Some("8BITMIME"));
        assert_eq!(cli.options, vec!["em"]);
        assert_eq!(cli.recipients, vec!["root"]);
        assert!(cli.ignore_dots());
        assert!(!cli.extract_recipients);
    }

    #[test]
    fn test_oi_means_ignore_dots() {
        let cli = Cli::try_parse_from(["sendmail", "-oi", "-t"]).unwrap();

        assert!(cli.extract_recipients);
        assert!(cli.ignore_dots());
        assert!(cli.recipients.is_empty());
    }

    #[test]
    fn test_dots_end_input_by_default() {
        let cli = Cli::try_parse_from(["sendmail", "-f", "root@pbx", "ops@example.com"]).unwrap();

        assert!(!cli.ignore_dots());
        assert_eq!(cli.sender.as_deref(), Some("root@pbx"));
        assert_eq!(cli.recipients, vec!["ops@example.com"]);
    }
}
