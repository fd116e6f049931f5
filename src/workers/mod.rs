//! Workers: the capabilities the orchestration loop dispatches to.
//!
//! Each worker implements [`Worker`] and returns its output map or a
//! [`WorkerError`]. The registry turns both into a uniform [`WorkerResult`].
//!
//! - `LanguageSelector`: picks the tech stack (`language`)
//! - `Planner`: writes `PLAN.md` (`planner`)
//! - `FrontendCoder` / `BackendCoder`: write source files (`coder`)
//! - `TerminalAgent`: runs install commands (`terminal`)
//! - `Tester`: writes tests and `TEST_REPORT.md` (`tester`)
//! - `Debugger`: writes fixes (`debugger`)
//! - `DocumentationAgent`: writes `README.md` (`documentation`)
//! - `GitAgent`: initializes and commits the repository (`git`)

pub mod coder;
pub mod debugger;
pub mod documentation;
pub mod files;
pub mod git;
pub mod language;
pub mod planner;
pub mod terminal;
pub mod tester;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::exec::CommandRunner;
use crate::orchestrator::{ProjectContext, WorkerName, WorkerRegistry};

pub use coder::{BackendCoder, FrontendCoder};
pub use debugger::Debugger;
pub use documentation::DocumentationAgent;
pub use git::GitAgent;
pub use language::LanguageSelector;
pub use planner::Planner;
pub use terminal::TerminalAgent;
pub use tester::Tester;

/// Structured output of a successful worker run.
pub type WorkerOutput = Map<String, Value>;

/// A capability the orchestrator can invoke by name.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Perform `task` against the project described by `ctx`.
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError>;
}

/// Uniform outcome of one worker invocation.
///
/// `error` is present exactly when the invocation failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerResult {
    success: bool,
    output: WorkerOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl WorkerResult {
    pub fn success(output: WorkerOutput) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Map::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn output(&self) -> &WorkerOutput {
        &self.output
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<Result<WorkerOutput, WorkerError>> for WorkerResult {
    fn from(result: Result<WorkerOutput, WorkerError>) -> Self {
        match result {
            Ok(output) => Self::success(output),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Build a registry with every production worker bound.
pub fn standard_registry(
    backend: Arc<dyn GenerationBackend>,
    commands: CommandRunner,
) -> WorkerRegistry {
    WorkerRegistry::new()
        .with(WorkerName::LanguageSelector, LanguageSelector::new(backend.clone()))
        .with(WorkerName::Planner, Planner::new(backend.clone()))
        .with(WorkerName::FrontendCoder, FrontendCoder::new(backend.clone()))
        .with(WorkerName::BackendCoder, BackendCoder::new(backend.clone()))
        .with(
            WorkerName::TerminalAgent,
            TerminalAgent::new(backend.clone(), commands.clone()),
        )
        .with(WorkerName::Tester, Tester::new(backend.clone(), commands))
        .with(WorkerName::Debugger, Debugger::new(backend.clone()))
        .with(WorkerName::DocumentationAgent, DocumentationAgent::new(backend))
        .with(WorkerName::GitAgent, GitAgent::new())
}

/// Read an optional UTF-8 file under the project root.
pub(crate) fn read_optional(root: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(root.join(name)).ok()
}

pub(crate) fn string_list(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}
