//! File configuration for crewforge.
//!
//! Read from `crewforge.toml` in the workspace. Every section and key is
//! optional. Values are layered file → environment → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [run]
//! max_steps = 50
//! max_failures = 3
//! projects_dir = "projects"
//!
//! [agent]
//! command = "claude"
//! args = ["--dangerously-skip-permissions", "--print", "--output-format", "stream-json", "--verbose"]
//! timeout_secs = 600
//! max_retries = 3
//! retry_base_delay_ms = 1000
//!
//! [commands]
//! timeout_secs = 300
//!
//! [logging]
//! file = "builder.log"
//! level = "info"
//! ```
//!
//! # Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `MAX_LOOPS` | `run.max_steps` |
//! | `MAX_ERRORS` | `run.max_failures` |
//! | `CREWFORGE_AGENT_CMD`, `CLAUDE_CMD` | `agent.command` (first set wins) |
//! | `LOG_LEVEL` | `logging.level` |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::cli::default_agent_args;
use crate::exec::DEFAULT_COMMAND_TIMEOUT_SECS;
use crate::orchestrator::{DEFAULT_MAX_FAILURES, DEFAULT_MAX_STEPS};

/// Name of the configuration file inside the workspace.
pub const CONFIG_FILE: &str = "crewforge.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Loop limits and project placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Directory, relative to the workspace, that holds generated projects
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,
}

fn default_max_steps() -> u32 {
    DEFAULT_MAX_STEPS
}

fn default_max_failures() -> u32 {
    DEFAULT_MAX_FAILURES
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from("projects")
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_failures: default_max_failures(),
            projects_dir: default_projects_dir(),
        }
    }
}

/// The agent CLI used for text generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_agent_command")]
    pub command: String,
    #[serde(default = "default_agent_args")]
    pub args: Vec<String>,
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per generation, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_agent_command() -> String {
    "claude".to_string()
}

fn default_agent_timeout_secs() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            args: default_agent_args(),
            timeout_secs: default_agent_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// Commands run inside generated projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsSection {
    #[serde(default = "default_command_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_command_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log file, relative to the workspace unless absolute
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("builder.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

/// The complete crewforge.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewToml {
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub commands: CommandsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl CrewToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse crewforge.toml")
    }

    /// Load `crewforge.toml` from `workspace`, or defaults if it is absent.
    pub fn load_or_default(workspace: &Path) -> Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize crewforge.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply overrides from the process environment and return warnings
    /// for values that were ignored.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` as the environment.
    ///
    /// Unparseable numbers are ignored and reported in the returned warnings.
    /// Nothing is logged here: this runs before the subscriber is installed.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(raw) = lookup("MAX_LOOPS") {
            match raw.trim().parse() {
                Ok(n) => self.run.max_steps = n,
                Err(_) => warnings.push(format!(
                    "ignoring invalid MAX_LOOPS '{}', keeping max_steps = {}",
                    raw, self.run.max_steps
                )),
            }
        }
        if let Some(raw) = lookup("MAX_ERRORS") {
            match raw.trim().parse() {
                Ok(n) => self.run.max_failures = n,
                Err(_) => warnings.push(format!(
                    "ignoring invalid MAX_ERRORS '{}', keeping max_failures = {}",
                    raw, self.run.max_failures
                )),
            }
        }
        if let Some(command) = lookup("CREWFORGE_AGENT_CMD")
            .or_else(|| lookup("CLAUDE_CMD"))
            .filter(|c| !c.trim().is_empty())
        {
            self.agent.command = command;
        }
        if let Some(level) = lookup("LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
            self.logging.level = level.trim().to_lowercase();
        }

        warnings
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.run.max_steps == 0 {
            warnings.push("run.max_steps is 0: every run will stop before doing any work".to_string());
        }
        if self.run.max_failures == 0 {
            warnings.push("run.max_failures is 0: treated as 1, the first failure aborts".to_string());
        }
        if self.agent.command.trim().is_empty() {
            warnings.push("agent.command is empty".to_string());
        }
        if self.agent.timeout_secs == 0 {
            warnings.push("agent.timeout_secs is 0: every generation will time out".to_string());
        }
        if self.agent.max_retries == 0 {
            warnings.push("agent.max_retries is 0: treated as a single attempt".to_string());
        }
        if self.commands.timeout_secs == 0 {
            warnings.push("commands.timeout_secs is 0: every command will time out".to_string());
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            warnings.push(format!(
                "Invalid logging.level '{}'. Valid values: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        warnings
    }
}
