//! Text-generation backend used by the LLM-driven workers.
//!
//! - `GenerationBackend`: the seam every worker generates through
//! - `CliBackend`: spawns the agent CLI (Claude by default) per request
//! - `RetryingBackend`: exponential-backoff wrapper around any backend

pub mod cli;
pub mod stream;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::errors::BackendError;

pub use cli::CliBackend;

/// Produces a text response for a prompt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a response for `prompt`, running with `working_dir` as the
    /// agent's current directory.
    async fn generate(&self, prompt: &str, working_dir: &Path) -> Result<String, BackendError>;
}

/// Retry policy for generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Wraps a backend and retries failed generations with exponential backoff.
pub struct RetryingBackend<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: GenerationBackend> RetryingBackend<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<B: GenerationBackend> GenerationBackend for RetryingBackend<B> {
    async fn generate(&self, prompt: &str, working_dir: &Path) -> Result<String, BackendError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.generate(prompt, working_dir).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "generation attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempts, error = %e, "all generation attempts failed");
                    return Err(e);
                }
            }
        }
    }
}
