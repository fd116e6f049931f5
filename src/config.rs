use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{CliBackend, RetryPolicy, RetryingBackend};
use crate::crew_config::{CONFIG_FILE, CrewToml};
use crate::exec::CommandRunner;

/// Runtime configuration for crewforge.
///
/// Resolved from `crewforge.toml` and the environment; CLI flags are applied
/// on top with [`Config::with_limits`]. Relative paths from the file are
/// anchored at the workspace.
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: PathBuf,
    pub projects_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub max_steps: u32,
    pub max_failures: u32,
    pub agent_command: String,
    pub agent_args: Vec<String>,
    pub agent_timeout: Duration,
    pub retry: RetryPolicy,
    pub command_timeout: Duration,
    pub verbose: bool,
    /// Environment overrides that were ignored; reported once logging is up
    pub env_warnings: Vec<String>,
}

fn anchor(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

impl Config {
    /// Load file and environment configuration for `workspace`.
    pub fn load(workspace: &Path, verbose: bool) -> Result<Self> {
        Self::load_with_env(workspace, verbose, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with `lookup` standing in for the environment.
    pub fn load_with_env(
        workspace: &Path,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let workspace = workspace
            .canonicalize()
            .with_context(|| format!("Failed to resolve workspace {}", workspace.display()))?;
        let mut toml = CrewToml::load_or_default(&workspace)?;
        let env_warnings = toml.apply_overrides_from(lookup);
        let mut config = Self::from_toml(workspace, &toml, verbose);
        config.env_warnings = env_warnings;
        Ok(config)
    }

    /// Resolve an already-layered file configuration.
    pub fn from_toml(workspace: PathBuf, toml: &CrewToml, verbose: bool) -> Self {
        Self {
            projects_dir: anchor(&workspace, &toml.run.projects_dir),
            log_file: anchor(&workspace, &toml.logging.file),
            log_level: toml.logging.level.clone(),
            max_steps: toml.run.max_steps,
            max_failures: toml.run.max_failures,
            agent_command: toml.agent.command.clone(),
            agent_args: toml.agent.args.clone(),
            agent_timeout: Duration::from_secs(toml.agent.timeout_secs),
            retry: RetryPolicy {
                max_attempts: toml.agent.max_retries.max(1),
                base_delay: Duration::from_millis(toml.agent.retry_base_delay_ms),
            },
            command_timeout: Duration::from_secs(toml.commands.timeout_secs),
            verbose,
            env_warnings: Vec::new(),
            workspace,
        }
    }

    /// Apply CLI overrides for the loop limits.
    pub fn with_limits(mut self, max_steps: Option<u32>, max_failures: Option<u32>) -> Self {
        if let Some(max_steps) = max_steps {
            self.max_steps = max_steps;
        }
        if let Some(max_failures) = max_failures {
            self.max_failures = max_failures;
        }
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.workspace.join(CONFIG_FILE)
    }

    /// The generation backend: the agent CLI wrapped in retries.
    pub fn backend(&self) -> RetryingBackend<CliBackend> {
        RetryingBackend::new(
            CliBackend::new(&self.agent_command, self.agent_args.clone(), self.agent_timeout),
            self.retry,
        )
    }

    pub fn command_runner(&self) -> CommandRunner {
        CommandRunner::new(self.command_timeout)
    }
}
