use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

use super::files::write_project_file;
use super::{Worker, WorkerOutput};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::orchestrator::ProjectContext;
use crate::orchestrator::artifacts::DOCS_FILE;
use crate::prompts;

// A response that is entirely one ```markdown fence
static WRAPPING_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\n(.*)\n```\s*$").unwrap());

/// Writes the project README.
pub struct DocumentationAgent {
    backend: Arc<dyn GenerationBackend>,
}

impl DocumentationAgent {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

fn unwrap_fence(text: &str) -> &str {
    let trimmed = text.trim();
    WRAPPING_FENCE_REGEX
        .captures(trimmed)
        .and_then(|cap| cap.get(1))
        .map_or(trimmed, |m| m.as_str())
}

#[async_trait]
impl Worker for DocumentationAgent {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let prompt = prompts::documentation(task, ctx);
        let response = self.backend.generate(&prompt, &ctx.project_path).await?;

        let readme = unwrap_fence(&response).trim();
        if readme.is_empty() {
            return Err(WorkerError::InvalidResponse("documentation was empty".into()));
        }
        write_project_file(&ctx.project_path, DOCS_FILE, &format!("{}\n", readme))?;
        tracing::info!(chars = readme.len(), "wrote {}", DOCS_FILE);

        let mut output = Map::new();
        output.insert("file".into(), Value::String(DOCS_FILE.to_string()));
        output.insert("chars".into(), Value::from(readme.len()));
        Ok(output)
    }
}
