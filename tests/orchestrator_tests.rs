//! End-to-end orchestration runs against scripted workers.
//!
//! Workers write real checkpoint files into a temporary project so the
//! filesystem artifact probe drives the schedule exactly as in a live run.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crewforge::errors::WorkerError;
use crewforge::orchestrator::{
    Orchestrator, ProjectContext, RunOutcome, StepKind, WorkerName, WorkerRegistry,
};
use crewforge::project::Project;
use crewforge::ui::RunUI;
use crewforge::workers::{Worker, WorkerOutput};

type CallLog = Arc<Mutex<Vec<(WorkerName, String)>>>;

#[derive(Clone)]
enum Action {
    Succeed,
    Write(&'static str, &'static str),
    Mkdir(&'static str),
    Output(Value),
    Fail(&'static str),
    Panic,
}

/// Plays back a list of actions, repeating the last one once exhausted.
struct Scripted {
    name: WorkerName,
    actions: Mutex<VecDeque<Action>>,
    log: CallLog,
}

impl Scripted {
    fn new(name: WorkerName, log: &CallLog, actions: Vec<Action>) -> Self {
        Self {
            name,
            actions: Mutex::new(actions.into()),
            log: Arc::clone(log),
        }
    }

    fn next_action(&self) -> Action {
        let mut actions = self.actions.lock().unwrap();
        if actions.len() > 1 {
            actions.pop_front().unwrap()
        } else {
            actions.front().cloned().unwrap_or(Action::Succeed)
        }
    }
}

#[async_trait]
impl Worker for Scripted {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        self.log.lock().unwrap().push((self.name, task.to_string()));
        match self.next_action() {
            Action::Succeed => Ok(Map::new()),
            Action::Write(file, content) => {
                std::fs::write(ctx.project_path.join(file), content).unwrap();
                Ok(Map::new())
            }
            Action::Mkdir(dir) => {
                std::fs::create_dir_all(ctx.project_path.join(dir)).unwrap();
                Ok(Map::new())
            }
            Action::Output(value) => Ok(value.as_object().cloned().unwrap_or_default()),
            Action::Fail(msg) => Err(WorkerError::InvalidResponse(msg.to_string())),
            Action::Panic => panic!("scripted panic"),
        }
    }
}

struct Harness {
    _dir: TempDir,
    project: Project,
    log: CallLog,
    scripts: Vec<(WorkerName, Vec<Action>)>,
}

impl Harness {
    /// Every worker scripted to do its job on the first try.
    fn happy() -> Self {
        let dir = TempDir::new().unwrap();
        let project = Project::create(dir.path(), "Build a todo app").unwrap();
        let scripts = vec![
            (
                WorkerName::LanguageSelector,
                vec![Action::Output(json!({"language": "python", "framework": "flask"}))],
            ),
            (WorkerName::Planner, vec![Action::Write("PLAN.md", "# Plan\n")]),
            (WorkerName::FrontendCoder, vec![Action::Write("index.html", "<html></html>")]),
            (WorkerName::BackendCoder, vec![Action::Write("app.py", "print('hi')\n")]),
            (WorkerName::TerminalAgent, vec![Action::Succeed]),
            (WorkerName::Tester, vec![Action::Write("TEST_REPORT.md", "Status: PASSED\n")]),
            (WorkerName::Debugger, vec![Action::Succeed]),
            (WorkerName::DocumentationAgent, vec![Action::Write("README.md", "# Todo\n")]),
            (WorkerName::GitAgent, vec![Action::Mkdir(".git")]),
        ];
        Self {
            _dir: dir,
            project,
            log: Arc::new(Mutex::new(Vec::new())),
            scripts,
        }
    }

    fn script(mut self, name: WorkerName, actions: Vec<Action>) -> Self {
        self.scripts.retain(|(n, _)| *n != name);
        self.scripts.push((name, actions));
        self
    }

    fn without(mut self, name: WorkerName) -> Self {
        self.scripts.retain(|(n, _)| *n != name);
        self
    }

    fn orchestrator(&self, max_steps: u32, max_failures: u32) -> Orchestrator {
        let mut registry = WorkerRegistry::new();
        for (name, actions) in &self.scripts {
            registry.register(*name, Scripted::new(*name, &self.log, actions.clone()));
        }
        Orchestrator::new(registry, max_steps, max_failures)
            .with_ui(Arc::new(RunUI::hidden(max_steps)))
    }

    fn calls(&self) -> Vec<WorkerName> {
        self.log.lock().unwrap().iter().map(|(name, _)| *name).collect()
    }
}

#[tokio::test]
async fn test_happy_path_runs_every_worker_once_in_order() {
    let harness = Harness::happy();
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Finished);
    assert_eq!(
        harness.calls(),
        vec![
            WorkerName::LanguageSelector,
            WorkerName::Planner,
            WorkerName::FrontendCoder,
            WorkerName::BackendCoder,
            WorkerName::TerminalAgent,
            WorkerName::Tester,
            WorkerName::DocumentationAgent,
            WorkerName::GitAgent,
        ]
    );
    assert_eq!(report.completed_steps, harness.calls());
    // Eight dispatches plus the step that decided to finish
    assert_eq!(report.steps, 9);
    assert_eq!(report.history.len(), 8);
    assert!(report.history.iter().all(|r| r.succeeded && r.kind == StepKind::Scheduled));
    assert_eq!(report.project_name, "build_a_todo_app");
}

#[tokio::test]
async fn test_scheduled_workers_receive_the_goal_as_task() {
    let harness = Harness::happy();
    harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    let log = harness.log.lock().unwrap();
    assert!(log.iter().all(|(_, task)| task == "Build a todo app"));
}

#[tokio::test]
async fn test_failing_tests_alternate_debugger_and_tester() {
    let harness = Harness::happy().script(
        WorkerName::Tester,
        vec![
            Action::Write("TEST_REPORT.md", "Status: FAILED\n"),
            Action::Write("TEST_REPORT.md", "Status: PASSED\n"),
        ],
    );
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Finished);
    assert_eq!(
        &harness.calls()[5..],
        &[
            WorkerName::Tester,
            WorkerName::Debugger,
            WorkerName::Tester,
            WorkerName::DocumentationAgent,
            WorkerName::GitAgent,
        ]
    );
    // The debugger was scheduled by the rule table, not injected
    let debugger = report
        .history
        .iter()
        .find(|r| r.worker == WorkerName::Debugger)
        .unwrap();
    assert_eq!(debugger.kind, StepKind::Scheduled);
}

#[tokio::test]
async fn test_persistent_failure_aborts_on_third_strike() {
    let harness = Harness::happy()
        .script(WorkerName::Planner, vec![Action::Fail("no plan")])
        .script(WorkerName::Debugger, vec![Action::Fail("cannot help")]);
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(
        report.outcome,
        RunOutcome::Aborted {
            last_error: "Unusable response: no plan".to_string()
        }
    );
    assert_eq!(
        harness.calls(),
        vec![
            WorkerName::LanguageSelector,
            WorkerName::Planner,
            WorkerName::Debugger,
            WorkerName::Planner,
        ]
    );
    let scheduled = report
        .history
        .iter()
        .filter(|r| r.kind == StepKind::Scheduled)
        .count();
    assert_eq!(scheduled, 3);
    assert_eq!(report.history[2].kind, StepKind::Recovery);
    assert!(!report.project_name.is_empty());
}

#[tokio::test]
async fn test_recovery_task_names_the_failed_worker() {
    let harness = Harness::happy()
        .script(WorkerName::Planner, vec![Action::Fail("no plan")])
        .script(WorkerName::Debugger, vec![Action::Fail("cannot help")]);
    harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    let log = harness.log.lock().unwrap();
    let (_, task) = log
        .iter()
        .find(|(name, _)| *name == WorkerName::Debugger)
        .unwrap();
    assert!(task.contains("Planner"));
    assert!(task.contains("no plan"));
}

#[tokio::test]
async fn test_successful_recovery_resets_the_failure_streak() {
    let harness = Harness::happy().script(
        WorkerName::Planner,
        vec![
            Action::Fail("flaky"),
            Action::Fail("flaky"),
            Action::Write("PLAN.md", "# Plan\n"),
        ],
    );
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    // Two planner failures, each followed by a debugger success, never reach
    // three in a row
    assert_eq!(report.outcome, RunOutcome::Finished);
    let recoveries = report
        .history
        .iter()
        .filter(|r| r.kind == StepKind::Recovery)
        .count();
    assert_eq!(recoveries, 2);
    assert!(harness.project.path.join(".git").is_dir());
}

#[tokio::test]
async fn test_threshold_of_one_aborts_without_recovery() {
    let harness = Harness::happy().script(WorkerName::LanguageSelector, vec![Action::Fail("offline")]);
    let report = harness
        .orchestrator(50, 1)
        .run(&harness.project, "Build a todo app")
        .await;

    assert!(matches!(report.outcome, RunOutcome::Aborted { .. }));
    assert_eq!(harness.calls(), vec![WorkerName::LanguageSelector]);
    assert_eq!(report.steps, 1);
}

#[tokio::test]
async fn test_step_ceiling_exhausts_the_run() {
    let harness = Harness::happy();
    let report = harness
        .orchestrator(3, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Exhausted { steps: 3 });
    assert_eq!(report.outcome.exit_code(), 4);
    assert_eq!(
        harness.calls(),
        vec![
            WorkerName::LanguageSelector,
            WorkerName::Planner,
            WorkerName::FrontendCoder,
        ]
    );
}

#[tokio::test]
async fn test_panicking_worker_is_contained() {
    let harness = Harness::happy()
        .script(WorkerName::FrontendCoder, vec![Action::Panic])
        .script(WorkerName::Debugger, vec![Action::Fail("cannot help")]);
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    match &report.outcome {
        RunOutcome::Aborted { last_error } => {
            assert!(last_error.contains("FrontendCoder panicked"));
            assert!(last_error.contains("scripted panic"));
        }
        other => panic!("Expected abort, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unregistered_worker_fails_like_any_other() {
    let harness = Harness::happy()
        .without(WorkerName::Planner)
        .without(WorkerName::Debugger);
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(
        report.outcome,
        RunOutcome::Aborted {
            last_error: "Unknown agent: Planner".to_string()
        }
    );
    let errors: Vec<_> = report
        .history
        .iter()
        .filter_map(|r| r.error.as_deref())
        .collect();
    assert_eq!(
        errors,
        vec![
            "Unknown agent: Planner",
            "Unknown agent: Debugger",
            "Unknown agent: Planner",
        ]
    );
}

#[tokio::test]
async fn test_empty_language_choice_trips_the_loop_guard() {
    let harness = Harness::happy().script(WorkerName::LanguageSelector, vec![Action::Output(json!({}))]);
    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Finished);
    assert_eq!(harness.calls(), vec![WorkerName::LanguageSelector]);
    assert_eq!(report.steps, 2);
}

#[tokio::test]
async fn test_existing_checkpoints_are_skipped() {
    let harness = Harness::happy();
    for file in ["PLAN.md", "README.md"] {
        std::fs::write(harness.project.path.join(file), "x").unwrap();
    }
    std::fs::write(harness.project.path.join("TEST_REPORT.md"), "Status: PASSED").unwrap();

    let report = harness
        .orchestrator(50, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Finished);
    assert_eq!(
        harness.calls(),
        vec![WorkerName::LanguageSelector, WorkerName::GitAgent]
    );
}

#[tokio::test]
async fn test_failed_recovery_reaching_threshold_aborts_at_once() {
    let harness = Harness::happy()
        .script(WorkerName::Planner, vec![Action::Fail("no plan")])
        .script(WorkerName::Debugger, vec![Action::Fail("cannot help")]);
    let report = harness
        .orchestrator(50, 2)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(
        report.outcome,
        RunOutcome::Aborted {
            last_error: "Unusable response: cannot help".to_string()
        }
    );
    assert_eq!(
        harness.calls(),
        vec![
            WorkerName::LanguageSelector,
            WorkerName::Planner,
            WorkerName::Debugger,
        ]
    );
    // The recovery ran inside step 2; no further step was started
    assert_eq!(report.steps, 2);
    assert_eq!(report.history.last().unwrap().kind, StepKind::Recovery);
}

#[tokio::test]
async fn test_finishing_on_the_last_allowed_step_is_not_exhaustion() {
    let harness = Harness::happy();
    let report = harness
        .orchestrator(9, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Finished);
    assert_eq!(report.steps, 9);
    assert_eq!(report.outcome.exit_code(), 0);
}

#[tokio::test]
async fn test_ceiling_one_short_of_finishing_exhausts() {
    let harness = Harness::happy();
    let report = harness
        .orchestrator(8, 3)
        .run(&harness.project, "Build a todo app")
        .await;

    assert_eq!(report.outcome, RunOutcome::Exhausted { steps: 8 });
    assert_eq!(report.history.len(), 8);
}
