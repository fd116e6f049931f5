use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::context::WorkerName;
use crate::workers::WorkerResult;

/// Why a worker was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Chosen by the decision engine
    Scheduled,
    /// Injected by the escalation controller after a failure
    Recovery,
}

/// One worker invocation that actually ran.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Loop step during which the invocation happened
    pub step: u32,
    pub worker: WorkerName,
    pub kind: StepKind,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Mutable bookkeeping for a single orchestration run.
///
/// Owned by one `Orchestrator::run` call and dropped when it returns. Nothing
/// here survives across runs.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub step_counter: u32,
    pub consecutive_failures: u32,
    pub last_action: Option<WorkerName>,
    pub last_error: Option<String>,
    /// Every invocation, scheduled and recovery, in execution order
    pub history: Vec<StepRecord>,
    /// Workers that completed successfully, in order
    pub completed_steps: Vec<WorkerName>,
    pub language_config: Option<Map<String, Value>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the step counter and return the new step index.
    pub fn begin_step(&mut self) -> u32 {
        self.step_counter += 1;
        self.step_counter
    }

    /// Fold a worker result into the run state.
    ///
    /// Success resets the failure streak, records the worker as the last
    /// action and, for the language selector, stores its output as the tech
    /// stack. Failure extends the streak and remembers the error.
    pub fn record(&mut self, worker: WorkerName, kind: StepKind, result: &WorkerResult) {
        self.history.push(StepRecord {
            step: self.step_counter,
            worker,
            kind,
            succeeded: result.is_success(),
            error: result.error().map(str::to_string),
            timestamp: Utc::now(),
        });

        if result.is_success() {
            self.consecutive_failures = 0;
            self.last_action = Some(worker);
            self.completed_steps.push(worker);
            if worker == WorkerName::LanguageSelector {
                self.language_config = Some(result.output().clone());
            }
        } else {
            self.consecutive_failures += 1;
            self.last_error = result.error().map(str::to_string);
        }
    }

    /// Number of scheduled (non-recovery) invocations so far.
    pub fn scheduled_invocations(&self) -> usize {
        self.history
            .iter()
            .filter(|r| r.kind == StepKind::Scheduled)
            .count()
    }
}
