use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::GenerationBackend;
use super::stream::StreamCollector;
use crate::errors::BackendError;

/// Flags passed to the Claude CLI when no explicit args are configured.
pub fn default_agent_args() -> Vec<String> {
    vec![
        "--dangerously-skip-permissions".to_string(),
        "--print".to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
    ]
}

/// Runs the agent CLI once per generation request.
///
/// The prompt is written to the child's stdin; stdout is folded through a
/// [`StreamCollector`]. A non-zero exit is an error even if text was produced.
#[derive(Debug, Clone)]
pub struct CliBackend {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CliBackend {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }

    async fn run(&self, prompt: &str, working_dir: &Path) -> Result<String, BackendError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(working_dir)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendError::SpawnFailed {
                command: self.command.clone(),
                source,
            })?;

        tracing::debug!(pid = child.id().unwrap_or(0), command = %self.command_line(), "agent process spawned");

        // An agent may exit before reading its whole prompt; its exit status
        // is the error worth reporting then.
        if let Some(mut stdin) = child.stdin.take() {
            let written: std::io::Result<()> = async {
                stdin.write_all(prompt.as_bytes()).await?;
                stdin.shutdown().await
            }
            .await;
            if let Err(e) = written
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e.into());
            }
        }

        let mut stderr = child.stderr.take();
        let stdout = child.stdout.take().ok_or_else(|| {
            BackendError::Io(std::io::Error::other("agent stdout was not captured"))
        })?;

        let mut collector = StreamCollector::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            collector.push_line(&line);
        }

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);
        if !status.success() {
            let mut err_text = String::new();
            if let Some(ref mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut err_text).await;
            }
            return Err(BackendError::NonZeroExit {
                exit_code,
                stderr: err_text.trim().to_string(),
            });
        }

        collector.finish()
    }
}

#[async_trait]
impl GenerationBackend for CliBackend {
    async fn generate(&self, prompt: &str, working_dir: &Path) -> Result<String, BackendError> {
        let start = Instant::now();
        tracing::info!(chars = prompt.len(), "sending prompt to agent");

        let response = tokio::time::timeout(self.timeout, self.run(prompt, working_dir))
            .await
            .map_err(|_| BackendError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        tracing::info!(
            chars = response.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "agent responded"
        );
        Ok(response)
    }
}
