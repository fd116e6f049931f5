use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::files::write_project_file;
use super::{Worker, WorkerOutput};
use crate::backend::GenerationBackend;
use crate::errors::WorkerError;
use crate::orchestrator::ProjectContext;
use crate::orchestrator::artifacts::PLAN_FILE;
use crate::prompts;
use crate::util::{parse_json_object, truncate_chars};

/// Produces the architecture plan and writes it to `PLAN.md`.
pub struct Planner {
    backend: Arc<dyn GenerationBackend>,
}

impl Planner {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Worker for Planner {
    async fn run(&self, _task: &str, ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
        let prompt = prompts::planner(&ctx.goal, ctx.language_config.as_ref());
        let response = self.backend.generate(&prompt, &ctx.project_path).await?;

        let plan = match parse_json_object(&response) {
            Some(plan) => plan,
            None => {
                tracing::warn!("plan response was not JSON, using fallback plan");
                fallback_plan(&response, &ctx.goal)
            }
        };

        let steps = plan.get("plan").and_then(Value::as_array).map_or(0, Vec::len);
        write_project_file(&ctx.project_path, PLAN_FILE, &render_plan(&plan, &ctx.goal))?;
        tracing::info!(steps, "wrote {}", PLAN_FILE);

        Ok(plan)
    }
}

/// Plan used when the model's answer can't be parsed. The raw answer
/// becomes the overview.
fn fallback_plan(response: &str, goal: &str) -> Map<String, Value> {
    let overview = if response.trim().is_empty() {
        format!("Build {} application", goal)
    } else {
        truncate_chars(response.trim(), 500)
    };

    let plan = json!({
        "plan": [{"step_id": 1, "description": format!("Implement {}", goal)}],
        "overview": overview,
        "file_structure": "Project structure to be determined",
        "frontend_architecture": "Frontend to be implemented",
        "backend_architecture": "Backend to be implemented",
        "api_endpoints": "Endpoints to be defined",
        "dependencies": ["To be determined"],
        "build_commands": [],
    });
    match plan {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn text_field(plan: &Map<String, Value>, key: &str, default: &str) -> String {
    match plan.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Null) | None => default.to_string(),
        Some(Value::String(_)) => default.to_string(),
        Some(other) => other.to_string(),
    }
}

fn list_field(plan: &Map<String, Value>, key: &str) -> Vec<String> {
    match plan.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Render the seven-section architecture plan.
pub fn render_plan(plan: &Map<String, Value>, goal: &str) -> String {
    let deps = list_field(plan, "dependencies");
    let deps = if deps.is_empty() {
        "- Dependencies to be determined".to_string()
    } else {
        deps.iter().map(|d| format!("- {}", d)).collect::<Vec<_>>().join("\n")
    };

    let build = list_field(plan, "build_commands");
    let build = if build.is_empty() {
        "# Build commands to be determined".to_string()
    } else {
        build.join("\n")
    };

    let mut md = String::from("# Architecture Plan\n\n");
    md.push_str(&format!(
        "## 1. Overview\n{}\n\n",
        text_field(plan, "overview", &format!("Implementation plan for: {}", goal))
    ));
    md.push_str(&format!(
        "## 2. File Structure\n```\n{}\n```\n\n",
        text_field(plan, "file_structure", "File structure to be determined")
    ));
    md.push_str(&format!(
        "## 3. Frontend Architecture\n{}\n\n",
        text_field(plan, "frontend_architecture", "Frontend architecture to be designed")
    ));
    md.push_str(&format!(
        "## 4. Backend Architecture\n{}\n\n",
        text_field(plan, "backend_architecture", "Backend architecture to be designed")
    ));
    md.push_str(&format!(
        "## 5. API Endpoints\n{}\n\n",
        text_field(plan, "api_endpoints", "API endpoints to be defined")
    ));
    md.push_str(&format!("## 6. Dependencies\n{}\n\n", deps));
    md.push_str(&format!("## 7. Build Commands\n```bash\n{}\n```\n", build));
    md
}
