use async_trait::async_trait;
use std::sync::Arc;

use super::{Worker, WorkerOutput};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::orchestrator::ProjectContext;
use crate::prompts;
use crate::util::parse_json_object;

/// Chooses the tech stack. The returned JSON object becomes the run's
/// language configuration.
pub struct LanguageSelector {
    backend: Arc<dyn GenerationBackend>,
}

impl LanguageSelector {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Worker for LanguageSelector {
    async fn run(&self, _task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let prompt = prompts::language_selector(&ctx.goal);
        let response = self.backend.generate(&prompt, &ctx.project_path).await?;

        let config = parse_json_object(&response).ok_or_else(|| {
            WorkerError::InvalidResponse("language selector did not return a JSON object".into())
        })?;

        tracing::info!(
            language = config.get("language").and_then(|v| v.as_str()).unwrap_or("?"),
            framework = config.get("framework").and_then(|v| v.as_str()).unwrap_or("?"),
            "tech stack selected"
        );
        Ok(config)
    }
}
