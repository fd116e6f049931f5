//! Typed error hierarchy for crewforge.
//!
//! Two enums cover the two places errors originate:
//! - `BackendError`: the text-generation backend (spawning the agent CLI)
//! - `WorkerError`: everything a worker can fail with, backend errors included
//!
//! Neither ever escapes the orchestration loop: the worker registry converts
//! them into failed `WorkerResult`s.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from a single text-generation call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to spawn agent command '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Agent command exited with code {exit_code}: {stderr}")]
    NonZeroExit { exit_code: i32, stderr: String },

    #[error("Agent command timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Agent reported an error: {0}")]
    Reported(String),

    #[error("Agent returned an empty response")]
    EmptyResponse,

    #[error("Agent I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a worker invocation.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Unknown agent: {name}")]
    UnknownWorker { name: String },

    #[error("Generation failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Unusable response: {0}")]
    InvalidResponse(String),

    #[error("Refusing to write outside the project: {}", path.display())]
    UnsafePath { path: PathBuf },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
