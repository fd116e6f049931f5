use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

use super::files::{parse_file_blocks, write_file_blocks, write_project_file};
use super::{Worker, WorkerOutput, string_list};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::exec::{CommandOutcome, CommandRunner};
use crate::orchestrator::ProjectContext;
use crate::orchestrator::artifacts::TEST_REPORT_FILE;
use crate::prompts::{self, TEST_COMMAND_PREFIX};
use crate::util::truncate_chars;

static TEST_COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^\s*{}\s*(.+?)\s*$", regex::escape(TEST_COMMAND_PREFIX))).unwrap()
});

const MAX_REPORT_OUTPUT_CHARS: usize = 8000;

/// Status line written to the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    /// No runnable command was announced
    NotRun,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::NotRun => "NOT RUN",
        }
    }
}

/// Writes tests, runs them and records the outcome in `TEST_REPORT.md`.
///
/// A failing test run is still a successful worker run: the report carries
/// the failure and the decision engine schedules the debugger from it.
pub struct Tester {
    backend: Arc<dyn GenerationBackend>,
    runner: CommandRunner,
}

impl Tester {
    pub fn new(backend: Arc<dyn GenerationBackend>, runner: CommandRunner) -> Self {
        Self { backend, runner }
    }
}

/// Find the announced test command, if any.
pub fn test_command(response: &str) -> Option<String> {
    TEST_COMMAND_REGEX
        .captures_iter(response)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim_matches('`').trim().to_string())
        .filter(|c| !c.is_empty())
        .last()
}

/// Render `TEST_REPORT.md`.
///
/// Only a failing report carries free text (project name, file names, command,
/// output). Passing and not-run reports use fixed wording free of failure
/// tokens.
fn render_report(
    ctx: &ProjectContext,
    status: TestStatus,
    files: &[String],
    command: Option<&str>,
    outcome: Option<&CommandOutcome>,
) -> String {
    let mut md = String::from("# Test Report\n\n");
    md.push_str(&format!("Generated: {}\n", chrono::Utc::now().to_rfc3339()));
    md.push_str(&format!("Status: {}\n\n", status.as_str()));

    match status {
        TestStatus::Passed => {
            md.push_str(&format!("Test files written: {}\n", files.len()));
            if let Some(outcome) = outcome {
                md.push_str(&format!("Exit code: {}\n", outcome.exit_code));
            }
            return md;
        }
        TestStatus::NotRun => {
            md.push_str(&format!("Test files written: {}\n", files.len()));
            md.push_str("No test command was provided.\n");
            return md;
        }
        TestStatus::Failed => {}
    }

    md.push_str(&format!("Project: {}\n\n", ctx.project_name));
    md.push_str("## Test Files\n");
    if files.is_empty() {
        md.push_str("- none\n");
    }
    for file in files {
        md.push_str(&format!("- {}\n", file));
    }
    md.push('\n');

    if let Some(command) = command {
        md.push_str(&format!("## Command\n`{}`\n\n", command));
    }

    if let Some(outcome) = outcome {
        md.push_str(&format!("## Output (exit code {})\n", outcome.exit_code));
        md.push_str("```\n");
        md.push_str(&truncate_chars(&outcome.combined_output(), MAX_REPORT_OUTPUT_CHARS));
        md.push_str("\n```\n");
    }
    md
}

#[async_trait]
impl Worker for Tester {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let prompt = prompts::tester(task, ctx);
        let response = self.backend.generate(&prompt, &ctx.project_path).await?;

        let files = write_file_blocks(&ctx.project_path, &parse_file_blocks(&response))?;
        let command = test_command(&response);

        let outcome = match command.as_deref() {
            Some(command) => {
                tracing::info!(command = %command, "running tests");
                Some(self.runner.run_line(command, &ctx.project_path).await)
            }
            None => None,
        };
        let status = match &outcome {
            Some(o) if o.success => TestStatus::Passed,
            Some(_) => TestStatus::Failed,
            None => TestStatus::NotRun,
        };

        let report = render_report(ctx, status, &files.written, command.as_deref(), outcome.as_ref());
        write_project_file(&ctx.project_path, TEST_REPORT_FILE, &report)?;
        tracing::info!(status = status.as_str(), files = files.written.len(), "wrote {}", TEST_REPORT_FILE);

        let mut output = Map::new();
        output.insert("files".into(), string_list(&files.written));
        output.insert("status".into(), Value::String(status.as_str().to_string()));
        if let Some(command) = command {
            output.insert("command".into(), Value::String(command));
        }
        if let Some(outcome) = outcome {
            output.insert("exit_code".into(), Value::from(outcome.exit_code));
        }
        Ok(output)
    }
}
