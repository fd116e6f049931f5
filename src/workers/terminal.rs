use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::{Worker, WorkerOutput};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::exec::CommandRunner;
use crate::orchestrator::ProjectContext;
use crate::prompts;
use crate::util::{parse_json_object, truncate_chars};

const MAX_CAPTURED_CHARS: usize = 2000;

/// Asks for install commands and runs them in the project root.
///
/// Succeeds once every command has been attempted, whatever their exit
/// codes; per-command outcomes are in the output under `results`.
pub struct TerminalAgent {
    backend: Arc<dyn GenerationBackend>,
    runner: CommandRunner,
}

impl TerminalAgent {
    pub fn new(backend: Arc<dyn GenerationBackend>, runner: CommandRunner) -> Self {
        Self { backend, runner }
    }
}

/// Pull the `commands` array out of a response object.
fn commands_from(response: &Map<String, Value>) -> Vec<String> {
    response
        .get("commands")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Worker for TerminalAgent {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let prompt = prompts::terminal_agent(task, ctx);
        let response = self.backend.generate(&prompt, &ctx.project_path).await?;
        let parsed = parse_json_object(&response).ok_or_else(|| {
            WorkerError::InvalidResponse("terminal agent did not return a JSON object".into())
        })?;

        let commands = commands_from(&parsed);
        tracing::info!(count = commands.len(), "executing commands");

        let mut results = Vec::with_capacity(commands.len());
        for command in &commands {
            tracing::info!(command = %command, "running");
            let outcome = self.runner.run_line(command, &ctx.project_path).await;
            if !outcome.success {
                tracing::warn!(command = %command, exit_code = outcome.exit_code, "command failed");
            }
            results.push(json!({
                "command": command,
                "success": outcome.success,
                "exit_code": outcome.exit_code,
                "stdout": truncate_chars(&outcome.stdout, MAX_CAPTURED_CHARS),
                "stderr": truncate_chars(&outcome.stderr, MAX_CAPTURED_CHARS),
            }));
        }

        let mut output = Map::new();
        output.insert("results".into(), Value::Array(results));
        Ok(output)
    }
}
