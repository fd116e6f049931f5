//! Artifact checkpoints read from the project directory.
//!
//! The orchestrator never parses these files. It only asks whether they exist,
//! and for the test report, whether the text mentions a failure.

use serde::Serialize;
use std::path::Path;

/// Implementation plan written by the planner.
pub const PLAN_FILE: &str = "PLAN.md";
/// Test report written by the tester.
pub const TEST_REPORT_FILE: &str = "TEST_REPORT.md";
/// Documentation written by the documentation agent.
pub const DOCS_FILE: &str = "README.md";
/// Directory marking an initialized git repository.
pub const VCS_DIR: &str = ".git";

/// Substrings that mark a test report as failing. Matched case-insensitively.
pub const FAILURE_TOKENS: [&str; 5] = ["FAIL", "FAILED", "Error", "ERROR", "Exception"];

/// Presence of each workflow checkpoint at the start of a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactSnapshot {
    pub plan_exists: bool,
    /// Text of the test report, `None` when the report does not exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_report: Option<String>,
    pub docs_exist: bool,
    pub vcs_initialized: bool,
}

impl ArtifactSnapshot {
    pub fn test_report_exists(&self) -> bool {
        self.test_report.is_some()
    }

    /// Whether an existing test report mentions a failure.
    ///
    /// A missing report has not failed.
    pub fn tests_failed(&self) -> bool {
        self.test_report
            .as_deref()
            .is_some_and(report_indicates_failure)
    }
}

/// Case-insensitive scan for any of [`FAILURE_TOKENS`].
///
/// This over-approximates: a passing report that merely narrates an error
/// message still counts as a failure.
pub fn report_indicates_failure(report: &str) -> bool {
    let lowered = report.to_lowercase();
    FAILURE_TOKENS
        .iter()
        .any(|token| lowered.contains(&token.to_lowercase()))
}

/// Source of artifact snapshots for a project root.
pub trait ArtifactProbe: Send + Sync {
    fn snapshot(&self, project_root: &Path) -> ArtifactSnapshot;
}

/// Reads checkpoints straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactProbe;

impl ArtifactProbe for FsArtifactProbe {
    fn snapshot(&self, project_root: &Path) -> ArtifactSnapshot {
        let report_path = project_root.join(TEST_REPORT_FILE);
        let test_report = if report_path.is_file() {
            match std::fs::read_to_string(&report_path) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(path = %report_path.display(), error = %e, "could not read test report");
                    Some(String::new())
                }
            }
        } else {
            None
        };

        ArtifactSnapshot {
            plan_exists: project_root.join(PLAN_FILE).is_file(),
            test_report,
            docs_exist: project_root.join(DOCS_FILE).is_file(),
            vcs_initialized: project_root.join(VCS_DIR).is_dir(),
        }
    }
}
