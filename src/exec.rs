//! Subprocess execution for workers that run project commands.
//!
//! `CommandRunner::run` never returns an error: spawn failures and timeouts
//! come back as unsuccessful [`CommandOutcome`]s with `exit_code == -1`, so a
//! single bad command cannot take a worker down.

use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutcome {
    fn unsuccessful(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: -1,
        }
    }

    /// Stdout and stderr joined, for reports.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Runs argv-style commands with a timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS))
    }
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `argv` with `cwd` as its working directory.
    pub async fn run(&self, argv: &[String], cwd: &Path) -> CommandOutcome {
        let Some((program, args)) = argv.split_first() else {
            return CommandOutcome::unsuccessful("empty command");
        };

        tracing::debug!(command = %argv.join(" "), cwd = %cwd.display(), "running command");

        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "command failed to start");
                return CommandOutcome::unsuccessful(format!("Failed to run '{}': {}", program, e));
            }
        };

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return CommandOutcome::unsuccessful(format!("Failed to wait for '{}': {}", program, e));
            }
            Err(_) => {
                tracing::warn!(program = %program, secs = self.timeout.as_secs(), "command timed out");
                return CommandOutcome::unsuccessful(format!(
                    "Command timed out after {} seconds",
                    self.timeout.as_secs()
                ));
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        CommandOutcome {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        }
    }

    /// Split a shell-style command line and run it.
    pub async fn run_line(&self, line: &str, cwd: &Path) -> CommandOutcome {
        match shell_words::split(line) {
            Ok(argv) => self.run(&argv, cwd).await,
            Err(e) => CommandOutcome::unsuccessful(format!("Could not parse command '{}': {}", line, e)),
        }
    }
}
