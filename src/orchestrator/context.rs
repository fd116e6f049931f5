//! Per-step project context handed to the decision engine and to every worker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::artifacts::ArtifactSnapshot;

/// Identity of every worker the orchestrator can schedule.
///
/// The set is closed: the decision engine can only ever name one of these, and a
/// registry binds each variant to a capability at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerName {
    LanguageSelector,
    Planner,
    FrontendCoder,
    BackendCoder,
    TerminalAgent,
    Tester,
    Debugger,
    DocumentationAgent,
    GitAgent,
}

impl WorkerName {
    pub const ALL: [WorkerName; 9] = [
        WorkerName::LanguageSelector,
        WorkerName::Planner,
        WorkerName::FrontendCoder,
        WorkerName::BackendCoder,
        WorkerName::TerminalAgent,
        WorkerName::Tester,
        WorkerName::Debugger,
        WorkerName::DocumentationAgent,
        WorkerName::GitAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerName::LanguageSelector => "LanguageSelector",
            WorkerName::Planner => "Planner",
            WorkerName::FrontendCoder => "FrontendCoder",
            WorkerName::BackendCoder => "BackendCoder",
            WorkerName::TerminalAgent => "TerminalAgent",
            WorkerName::Tester => "Tester",
            WorkerName::Debugger => "Debugger",
            WorkerName::DocumentationAgent => "DocumentationAgent",
            WorkerName::GitAgent => "GitAgent",
        }
    }
}

impl std::fmt::Display for WorkerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkerName {
    type Err = crate::errors::WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerName::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| crate::errors::WorkerError::UnknownWorker {
                name: s.to_string(),
            })
    }
}

/// Snapshot of everything known about the project at the start of a step.
///
/// Built fresh by the orchestration loop each iteration and never mutated
/// afterwards. Workers receive it read-only alongside their task.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub project_name: String,
    pub project_path: PathBuf,
    pub goal: String,
    pub last_action: Option<WorkerName>,
    /// 1-based index of the step being decided
    pub step_index: u32,
    pub completed_steps: Vec<WorkerName>,
    /// Tech stack recorded by the language selector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub artifacts: ArtifactSnapshot,
}

impl ProjectContext {
    /// Create a context for a project with no recorded progress.
    pub fn new(project_name: &str, project_path: impl Into<PathBuf>, goal: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            project_path: project_path.into(),
            goal: goal.to_string(),
            last_action: None,
            step_index: 0,
            completed_steps: Vec::new(),
            language_config: None,
            last_error: None,
            artifacts: ArtifactSnapshot::default(),
        }
    }

    /// Whether a usable tech-stack configuration has been recorded.
    ///
    /// An empty map counts as missing.
    pub fn has_language_config(&self) -> bool {
        self.language_config
            .as_ref()
            .is_some_and(|config| !config.is_empty())
    }

    /// Look up a top-level string value in the language configuration.
    pub fn language_value(&self, key: &str) -> Option<&str> {
        self.language_config
            .as_ref()
            .and_then(|config| config.get(key))
            .and_then(Value::as_str)
    }

    /// Render the context as pretty JSON for inclusion in prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
