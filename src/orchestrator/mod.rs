//! The workflow orchestration engine.
//!
//! - `context`: worker identities and the per-step project snapshot
//! - `artifacts`: filesystem checkpoints the decision rules read
//! - `decision`: pure rule table mapping context to the next worker
//! - `escalation`: three-strike failure policy
//! - `registry`: name → worker bindings with failure conversion
//! - `state`: per-run mutable bookkeeping and history
//! - `runner`: the bounded loop tying them together

pub mod artifacts;
pub mod context;
pub mod decision;
pub mod escalation;
pub mod registry;
pub mod runner;
pub mod state;

pub use artifacts::{ArtifactProbe, ArtifactSnapshot, FsArtifactProbe};
pub use context::{ProjectContext, WorkerName};
pub use decision::{Decision, NextStep, decide};
pub use escalation::{DEFAULT_MAX_FAILURES, Escalation, EscalationController};
pub use registry::WorkerRegistry;
pub use runner::{DEFAULT_MAX_STEPS, Orchestrator, RunOutcome, RunReport};
pub use state::{RunState, StepKind, StepRecord};
