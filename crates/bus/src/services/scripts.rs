//! External script execution.

use std::sync::Mutex;

use tokio::process::Command;
use tracing::{debug, warn};

use domain::services::FirewallCommand;

use crate::error::{BusError, BusResult};

/// Runs planned commands on the host.
#[async_trait::async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Runs `command` to completion.
    async fn run(&self, command: &FirewallCommand) -> BusResult<()>;
}

/// Runner spawning real processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessScriptRunner;

#[async_trait::async_trait]
impl ScriptRunner for ProcessScriptRunner {
    async fn run(&self, command: &FirewallCommand) -> BusResult<()> {
        let script = command.program.display().to_string();
        debug!(command = %command, "Running script");

        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .await
            .map_err(|e| BusError::ExternalScript {
                script: script.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(command = %command, status = %output.status, stderr = %stderr.trim(), "Script failed");
        Err(BusError::ExternalScript {
            script,
            reason: match output.status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            },
        })
    }
}

/// Runner recording commands instead of running them.
#[derive(Debug, Default)]
pub struct MockScriptRunner {
    /// Whether every run should fail.
    pub simulate_failure: bool,
    runs: Mutex<Vec<FirewallCommand>>,
}

impl MockScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<FirewallCommand> {
        self.runs.lock().map(|runs| runs.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ScriptRunner for MockScriptRunner {
    async fn run(&self, command: &FirewallCommand) -> BusResult<()> {
        if let Ok(mut runs) = self.runs.lock() {
            runs.push(command.clone());
        }
        if self.simulate_failure {
            return Err(BusError::ExternalScript {
                script: command.program.display().to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}
