use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::files::{parse_file_blocks, write_file_blocks};
use super::{Worker, WorkerOutput, string_list};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::orchestrator::ProjectContext;
use crate::prompts;
use crate::util::truncate_chars;

/// Recovery worker. Analyzes the failure described by its task (and the
/// current test report) and rewrites the affected files.
pub struct Debugger {
    backend: Arc<dyn GenerationBackend>,
}

impl Debugger {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Worker for Debugger {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let prompt = prompts::debugger(task, ctx);
        let response = self.backend.generate(&prompt, &ctx.project_path).await?;

        let files = write_file_blocks(&ctx.project_path, &parse_file_blocks(&response))?;
        tracing::info!(files = files.written.len(), "fixes applied");

        // Prose before the first file block is the analysis.
        let analysis = response
            .split("Filename:")
            .next()
            .unwrap_or_default()
            .trim();

        let mut output = Map::new();
        output.insert(
            "analysis".into(),
            Value::String(truncate_chars(analysis, 2000)),
        );
        output.insert("files".into(), string_list(&files.written));
        Ok(output)
    }
}
