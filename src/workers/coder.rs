use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::files::{parse_file_blocks, write_file_blocks};
use super::{Worker, WorkerOutput, read_optional, string_list};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::orchestrator::ProjectContext;
use crate::orchestrator::artifacts::PLAN_FILE;
use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Frontend,
    Backend,
}

impl Layer {
    fn label(self) -> &'static str {
        match self {
            Layer::Frontend => "frontend",
            Layer::Backend => "backend",
        }
    }
}

/// Shared implementation for both coders: prompt, parse `Filename:` blocks,
/// write them under the project root.
async fn generate_code(
    backend: &dyn GenerationBackend,
    layer: Layer,
    task: &str,
    ctx: &ProjectContext,
) -> Result<WorkerOutput, WorkerError> {
    let plan = read_optional(&ctx.project_path, PLAN_FILE);
    let prompt = match layer {
        Layer::Frontend => prompts::frontend_coder(task, ctx, plan.as_deref()),
        Layer::Backend => prompts::backend_coder(task, ctx, plan.as_deref()),
    };

    let response = backend.generate(&prompt, &ctx.project_path).await?;
    let blocks = parse_file_blocks(&response);
    if blocks.is_empty() {
        tracing::warn!(layer = layer.label(), "response contained no file blocks");
    }

    let files = write_file_blocks(&ctx.project_path, &blocks)?;
    tracing::info!(layer = layer.label(), files = files.written.len(), "code generated");

    let mut output = Map::new();
    output.insert("files".into(), string_list(&files.written));
    if !files.rejected.is_empty() {
        output.insert("rejected".into(), string_list(&files.rejected));
    }
    output.insert("layer".into(), Value::String(layer.label().to_string()));
    Ok(output)
}

/// Writes the user-facing part of the project.
pub struct FrontendCoder {
    backend: Arc<dyn GenerationBackend>,
}

impl FrontendCoder {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Worker for FrontendCoder {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        generate_code(self.backend.as_ref(), Layer::Frontend, task, ctx).await
    }
}

/// Writes the server side of the project.
pub struct BackendCoder {
    backend: Arc<dyn GenerationBackend>,
}

impl BackendCoder {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Worker for BackendCoder {
    async fn run(&self, task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        generate_code(self.backend.as_ref(), Layer::Backend, task, ctx).await
    }
}
