//! The bounded decide, dispatch and escalate loop for one project run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::artifacts::{ArtifactProbe, FsArtifactProbe};
use super::context::{ProjectContext, WorkerName};
use super::decision::decide;
use super::escalation::{Escalation, EscalationController};
use super::registry::WorkerRegistry;
use super::state::{RunState, StepKind, StepRecord};
use crate::project::Project;
use crate::ui::RunUI;

/// Default step ceiling.
pub const DEFAULT_MAX_STEPS: u32 = 50;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    /// The decision engine reported nothing left to do.
    Finished,
    /// The step ceiling was hit first.
    Exhausted { steps: u32 },
    /// The consecutive-failure threshold was reached.
    Aborted { last_error: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Finished)
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Finished => 0,
            RunOutcome::Aborted { .. } => 3,
            RunOutcome::Exhausted { .. } => 4,
        }
    }
}

/// Summary of one orchestration run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub project_name: String,
    pub outcome: RunOutcome,
    /// Steps consumed, including the one that decided to finish
    pub steps: u32,
    pub history: Vec<StepRecord>,
    pub completed_steps: Vec<WorkerName>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Drives the decide → dispatch → escalate loop for one project.
pub struct Orchestrator {
    registry: WorkerRegistry,
    escalation: EscalationController,
    probe: Box<dyn ArtifactProbe>,
    max_steps: u32,
    ui: Option<Arc<RunUI>>,
}

impl Orchestrator {
    pub fn new(registry: WorkerRegistry, max_steps: u32, max_failures: u32) -> Self {
        Self {
            registry,
            escalation: EscalationController::new(max_failures),
            probe: Box::new(FsArtifactProbe),
            max_steps,
            ui: None,
        }
    }

    /// Replace the filesystem artifact probe.
    pub fn with_probe(mut self, probe: impl ArtifactProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_ui(mut self, ui: Arc<RunUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    fn context(&self, project: &Project, goal: &str, state: &RunState) -> ProjectContext {
        ProjectContext {
            project_name: project.name.clone(),
            project_path: project.path.clone(),
            goal: goal.to_string(),
            last_action: state.last_action,
            step_index: state.step_counter,
            completed_steps: state.completed_steps.clone(),
            language_config: state.language_config.clone(),
            last_error: state.last_error.clone(),
            artifacts: self.probe.snapshot(&project.path),
        }
    }

    /// Run until the project is finished, the failure threshold is hit, or
    /// the step ceiling is reached.
    pub async fn run(&self, project: &Project, goal: &str) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = RunState::new();

        tracing::info!(
            %run_id,
            project = %project.name,
            max_steps = self.max_steps,
            max_failures = self.escalation.max_failures(),
            "starting run"
        );

        let outcome = loop {
            if state.step_counter >= self.max_steps {
                break RunOutcome::Exhausted {
                    steps: state.step_counter,
                };
            }

            let step = state.begin_step();
            let ctx = self.context(project, goal, &state);
            let decision = decide(&ctx);
            tracing::info!(step, next = %decision.next, reasoning = %decision.reasoning, "decision");

            let Some(worker) = decision.next.worker() else {
                break RunOutcome::Finished;
            };

            if let Some(ui) = &self.ui {
                ui.start_step(step, worker, &decision.reasoning);
            }
            let started = Instant::now();
            let result = self.registry.invoke(worker, goal, &ctx).await;
            state.record(worker, StepKind::Scheduled, &result);

            let Some(error) = result.error() else {
                tracing::info!(step, worker = %worker, "worker succeeded");
                if let Some(ui) = &self.ui {
                    ui.step_succeeded(step, worker, started.elapsed());
                }
                continue;
            };

            tracing::warn!(step, worker = %worker, failures = state.consecutive_failures, error, "worker failed");
            if let Some(ui) = &self.ui {
                ui.step_failed(step, worker, error, state.consecutive_failures);
            }

            match self
                .escalation
                .on_failure(worker, error, state.consecutive_failures)
            {
                Escalation::Continue => {}
                Escalation::Abort => break self.aborted(&state),
                Escalation::Recover {
                    worker: recovery,
                    task,
                } => {
                    if let Some(ui) = &self.ui {
                        ui.recovery(recovery, &task);
                    }
                    tracing::info!(step, worker = %recovery, failed = %worker, "invoking recovery");

                    let ctx = self.context(project, goal, &state);
                    let result = self.registry.invoke(recovery, &task, &ctx).await;
                    state.record(recovery, StepKind::Recovery, &result);

                    match result.error() {
                        None => tracing::info!(step, worker = %recovery, "recovery succeeded"),
                        Some(error) => {
                            tracing::warn!(step, worker = %recovery, failures = state.consecutive_failures, error, "recovery failed");
                            if self.escalation.should_abort(state.consecutive_failures) {
                                break self.aborted(&state);
                            }
                        }
                    }
                }
            }
        };

        match &outcome {
            RunOutcome::Finished => {
                tracing::info!(%run_id, steps = state.step_counter, "run finished")
            }
            RunOutcome::Exhausted { steps } => {
                tracing::warn!(%run_id, steps, "run exhausted its step limit")
            }
            RunOutcome::Aborted { last_error } => {
                tracing::error!(%run_id, failures = state.consecutive_failures, last_error = %last_error, "run aborted")
            }
        }

        let report = RunReport {
            run_id,
            project_name: project.name.clone(),
            outcome,
            steps: state.step_counter,
            history: state.history,
            completed_steps: state.completed_steps,
            started_at,
            finished_at: Utc::now(),
        };
        if let Some(ui) = &self.ui {
            ui.finish(&report);
        }
        report
    }

    fn aborted(&self, state: &RunState) -> RunOutcome {
        RunOutcome::Aborted {
            last_error: state
                .last_error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}
