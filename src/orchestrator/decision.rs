//! Workflow policy: maps a project context to the next worker.
//!
//! The policy is an ordered rule table evaluated top to bottom, first match
//! wins, followed by an anti-loop guard that has the final say:
//!
//! | Order | Condition                              | Next worker          |
//! |-------|----------------------------------------|----------------------|
//! | 1     | no tech-stack configuration            | `LanguageSelector`   |
//! | 2     | no `PLAN.md`                           | `Planner`            |
//! | 3     | last action was `Planner`              | `FrontendCoder`      |
//! | 4     | last action was `FrontendCoder`        | `BackendCoder`       |
//! | 5     | last action was `BackendCoder`         | `TerminalAgent`      |
//! | 6     | no `TEST_REPORT.md`                    | `Tester`             |
//! | 7     | test report mentions a failure         | `Debugger` / `Tester`|
//! | 8     | no `README.md`                         | `DocumentationAgent` |
//! | 9     | no `.git` directory                    | `GitAgent`           |
//! | 10    | otherwise                              | finished             |

use serde::Serialize;

use super::context::{ProjectContext, WorkerName};

/// What the orchestrator should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NextStep {
    Worker(WorkerName),
    Finished,
}

impl NextStep {
    pub fn worker(&self) -> Option<WorkerName> {
        match self {
            NextStep::Worker(w) => Some(*w),
            NextStep::Finished => None,
        }
    }
}

impl std::fmt::Display for NextStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextStep::Worker(w) => write!(f, "{}", w),
            NextStep::Finished => f.write_str("FINISHED"),
        }
    }
}

/// A scheduling decision and its human-readable rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub next: NextStep,
    pub reasoning: String,
}

/// Decide the next step for `ctx`.
///
/// Pure and deterministic: the same context always yields the same decision.
pub fn decide(ctx: &ProjectContext) -> Decision {
    let next = select(ctx);

    if let NextStep::Worker(worker) = next
        && ctx.last_action == Some(worker)
    {
        return Decision {
            next: NextStep::Finished,
            reasoning: format!("Loop prevented: {} already ran.", worker),
        };
    }

    Decision {
        next,
        reasoning: reasoning_for(next, ctx).to_string(),
    }
}

/// Evaluate the rule table without the anti-loop guard.
pub fn select(ctx: &ProjectContext) -> NextStep {
    let artifacts = &ctx.artifacts;
    let last = ctx.last_action;

    let worker = if !ctx.has_language_config() {
        WorkerName::LanguageSelector
    } else if !artifacts.plan_exists {
        WorkerName::Planner
    } else if last == Some(WorkerName::Planner) {
        WorkerName::FrontendCoder
    } else if last == Some(WorkerName::FrontendCoder) {
        WorkerName::BackendCoder
    } else if last == Some(WorkerName::BackendCoder) {
        WorkerName::TerminalAgent
    } else if !artifacts.test_report_exists() {
        WorkerName::Tester
    } else if artifacts.tests_failed() {
        match last {
            Some(WorkerName::Tester) => WorkerName::Debugger,
            _ => WorkerName::Tester,
        }
    } else if !artifacts.docs_exist {
        WorkerName::DocumentationAgent
    } else if !artifacts.vcs_initialized {
        WorkerName::GitAgent
    } else {
        return NextStep::Finished;
    };

    NextStep::Worker(worker)
}

fn reasoning_for(next: NextStep, ctx: &ProjectContext) -> &'static str {
    let worker = match next {
        NextStep::Finished => return "All steps complete.",
        NextStep::Worker(w) => w,
    };

    match worker {
        WorkerName::LanguageSelector => "Language configuration is missing.",
        WorkerName::Planner => "Implementation plan (PLAN.md) is missing.",
        WorkerName::FrontendCoder => "Plan complete, starting frontend development.",
        WorkerName::BackendCoder => "Frontend complete, moving to backend.",
        WorkerName::TerminalAgent => "Code complete, installing dependencies.",
        WorkerName::Tester if ctx.artifacts.tests_failed() => {
            "Debugging applied, re-running tests."
        }
        WorkerName::Tester => "Test report is missing.",
        WorkerName::Debugger => "Tests failed, triggering debugger.",
        WorkerName::DocumentationAgent => "Project documentation is missing.",
        WorkerName::GitAgent => "Initializing version control for generated project.",
    }
}
