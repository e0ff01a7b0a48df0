//! Log output of the bus tools.
//!
//! Everything is written to stderr; stdout carries tool output such as the
//! event dump. Broker consumers run for hours and log in full, while the
//! one-shot tools started by the switch or cron log one compact line per
//! event unless configured otherwise.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Value of `logging.format` that picks the tool's own default.
pub const AUTO_FORMAT: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human readable.
    Full,
    /// One line per event, no target.
    Compact,
    /// One JSON object per line with event fields flattened.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "pretty" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {:?}", other)),
        }
    }
}

impl LogFormat {
    /// Format for the configured value; `auto` resolves to `tool_default`.
    pub fn resolve(configured: &str, tool_default: LogFormat) -> Result<Self, String> {
        if configured.trim().eq_ignore_ascii_case(AUTO_FORMAT) {
            Ok(tool_default)
        } else {
            configured.parse()
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig, tool_default: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    // Config::validate rejects unknown formats.
    let format = LogFormat::resolve(&config.format, tool_default).unwrap_or(tool_default);
    match format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Compact => subscriber
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Full => subscriber
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
    }
}
