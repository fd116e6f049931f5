use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::context::{ProjectContext, WorkerName};
use crate::errors::WorkerError;
use crate::workers::{Worker, WorkerResult};

/// Fixed mapping from worker name to implementation.
///
/// `invoke` never fails: missing bindings, worker errors and panics all come
/// back as failed [`WorkerResult`]s.
#[derive(Default, Clone)]
pub struct WorkerRegistry {
    workers: HashMap<WorkerName, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `worker`, replacing any earlier binding.
    pub fn register(&mut self, name: WorkerName, worker: impl Worker + 'static) {
        self.workers.insert(name, Arc::new(worker));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: WorkerName, worker: impl Worker + 'static) -> Self {
        self.register(name, worker);
        self
    }

    pub fn contains(&self, name: WorkerName) -> bool {
        self.workers.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Run the worker bound to `name`.
    pub async fn invoke(&self, name: WorkerName, task: &str, ctx: &ProjectContext) -> WorkerResult {
        let Some(worker) = self.workers.get(&name) else {
            tracing::warn!(worker = %name, "no worker registered");
            return WorkerError::UnknownWorker {
                name: name.to_string(),
            }
            .into_failure();
        };

        let run = AssertUnwindSafe(worker.run(task, ctx)).catch_unwind().await;
        match run {
            Ok(result) => result.into(),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(worker = %name, panic = %message, "worker panicked");
                WorkerResult::failure(format!("{} panicked: {}", name, message))
            }
        }
    }

    /// Run a worker by its string name. Unparseable names fail like
    /// unregistered ones.
    pub async fn invoke_by_name(&self, name: &str, task: &str, ctx: &ProjectContext) -> WorkerResult {
        match name.parse::<WorkerName>() {
            Ok(worker) => self.invoke(worker, task, ctx).await,
            Err(e) => {
                tracing::warn!(worker = name, "unknown worker name");
                e.into_failure()
            }
        }
    }
}

impl WorkerError {
    fn into_failure(self) -> WorkerResult {
        WorkerResult::failure(self.to_string())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::WorkerOutput;
    use async_trait::async_trait;
    use serde_json::{Map, json};

    struct Echo;

    #[async_trait]
    impl Worker for Echo {
        async fn run(&self, task: &str, _ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
            let mut output = Map::new();
            output.insert("task".into(), json!(task));
            Ok(output)
        }
    }

    struct Broken;

    #[async_trait]
    impl Worker for Broken {
        async fn run(&self, _task: &str, _ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
            Err(WorkerError::InvalidResponse("garbage".into()))
        }
    }

    struct Panicky;

    #[async_trait]
    impl Worker for Panicky {
        async fn run(&self, _task: &str, _ctx: &ProjectContext) -> Result<WorkerOutput, WorkerError> {
            panic!("index out of bounds");
        }
    }

    fn ctx() -> ProjectContext {
        ProjectContext::new("demo", "/tmp/demo", "goal")
    }

    #[tokio::test]
    async fn test_invokes_bound_worker() {
        let registry = WorkerRegistry::new().with(WorkerName::Planner, Echo);
        let result = registry.invoke(WorkerName::Planner, "plan it", &ctx()).await;
        assert!(result.is_success());
        assert_eq!(result.output()["task"], "plan it");
    }

    #[tokio::test]
    async fn test_unbound_worker_is_a_failure() {
        let registry = WorkerRegistry::new();
        let result = registry.invoke(WorkerName::GitAgent, "commit", &ctx()).await;
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("Unknown agent: GitAgent"));
    }

    #[tokio::test]
    async fn test_unknown_name_is_a_failure() {
        let registry = WorkerRegistry::new().with(WorkerName::Planner, Echo);
        let result = registry.invoke_by_name("Researcher", "look up", &ctx()).await;
        assert_eq!(result.error(), Some("Unknown agent: Researcher"));

        let result = registry.invoke_by_name("Planner", "plan", &ctx()).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_worker_error_becomes_failure() {
        let registry = WorkerRegistry::new().with(WorkerName::Tester, Broken);
        let result = registry.invoke(WorkerName::Tester, "test", &ctx()).await;
        assert_eq!(result.error(), Some("Unusable response: garbage"));
        assert!(result.output().is_empty());
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let registry = WorkerRegistry::new().with(WorkerName::Debugger, Panicky);
        let result = registry.invoke(WorkerName::Debugger, "fix", &ctx()).await;
        assert!(!result.is_success());
        let error = result.error().unwrap();
        assert!(error.contains("Debugger panicked"));
        assert!(error.contains("index out of bounds"));
    }

    #[test]
    fn test_register_replaces_binding() {
        let mut registry = WorkerRegistry::new();
        registry.register(WorkerName::Planner, Echo);
        registry.register(WorkerName::Planner, Broken);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(WorkerName::Planner));
        assert!(!registry.contains(WorkerName::Tester));
    }
}
