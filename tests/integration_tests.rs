//! Integration tests for the crewforge binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn crewforge() -> Command {
    let mut cmd = cargo_bin_cmd!("crewforge");
    // Keep the host environment from leaking into runs
    for var in ["MAX_LOOPS", "MAX_ERRORS", "CLAUDE_CMD", "CREWFORGE_AGENT_CMD", "LOG_LEVEL", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn workspace() -> TempDir {
    TempDir::new().unwrap()
}

/// Workspace whose agent command always fails, with no retry delay.
fn failing_agent_workspace() -> TempDir {
    let dir = workspace();
    fs::write(
        dir.path().join("crewforge.toml"),
        "[agent]\ncommand = \"false\"\nargs = []\nmax_retries = 1\nretry_base_delay_ms = 0\n",
    )
    .unwrap();
    dir
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        crewforge()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("status"));
    }

    #[test]
    fn test_version() {
        crewforge().arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_is_usage_error() {
        crewforge().arg("frobnicate").assert().code(2);
    }
}

// =============================================================================
// Run Command Tests
// =============================================================================

mod run_command {
    use super::*;

    #[test]
    fn test_missing_goal_without_terminal_fails() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No goal provided"));
    }

    #[test]
    fn test_blank_goal_fails() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["run", "   "])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Goal cannot be empty"));
        assert!(!dir.path().join("projects").exists());
    }

    #[test]
    fn test_zero_step_ceiling_exits_as_exhausted() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["run", "--max-steps", "0", "Build", "a", "Todo", "App!"])
            .assert()
            .code(4)
            .stdout(predicate::str::contains("exhausted after 0 steps"));

        assert!(dir.path().join("projects/build_a_todo_app").is_dir());
        assert!(dir.path().join("builder.log").exists());
    }

    #[test]
    fn test_invalid_env_limit_is_reported_once_logging_is_up() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .env("MAX_LOOPS", "abc")
            .args(["run", "--max-steps", "0", "build app"])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("ignoring invalid MAX_LOOPS 'abc'"));

        let log = fs::read_to_string(dir.path().join("builder.log")).unwrap();
        assert!(log.contains("ignoring invalid MAX_LOOPS 'abc'"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_agent_aborts_with_exit_code_3() {
        let dir = failing_agent_workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["run", "notes api"])
            .assert()
            .code(3)
            .stdout(predicate::str::contains("aborted"))
            .stdout(predicate::str::contains("(recovery)"));
    }

    #[cfg(unix)]
    #[test]
    fn test_max_failures_flag_overrides_file() {
        let dir = failing_agent_workspace();
        // Threshold 1: the first failure aborts before any recovery
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["run", "--max-failures", "1", "notes api"])
            .assert()
            .code(3)
            .stdout(predicate::str::contains("(recovery)").not());
    }

    #[cfg(unix)]
    #[test]
    fn test_env_overrides_agent_command() {
        let dir = workspace();
        fs::write(
            dir.path().join("crewforge.toml"),
            "[agent]\ncommand = \"claude-that-does-not-exist\"\nargs = []\nmax_retries = 1\nretry_base_delay_ms = 0\n",
        )
        .unwrap();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .env("CREWFORGE_AGENT_CMD", "false")
            .args(["run", "notes api"])
            .assert()
            .code(3)
            .stdout(predicate::str::contains("exited with code 1"));
    }
}

// =============================================================================
// Config Command Tests
// =============================================================================

mod config_command {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created crewforge.toml"));

        let content = fs::read_to_string(dir.path().join("crewforge.toml")).unwrap();
        assert!(content.contains("max_steps = 50"));
        assert!(content.contains("[agent]"));
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = workspace();
        fs::write(dir.path().join("crewforge.toml"), "[run]\nmax_steps = 7\n").unwrap();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
        assert_eq!(
            fs::read_to_string(dir.path().join("crewforge.toml")).unwrap(),
            "[run]\nmax_steps = 7\n"
        );
    }

    #[test]
    fn test_config_show_without_file_uses_defaults() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using default configuration"))
            .stdout(predicate::str::contains("max_failures = 3"));
    }

    #[test]
    fn test_config_show_reflects_env() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .env("MAX_LOOPS", "12")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("max_steps = 12"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = workspace();
        fs::write(dir.path().join("crewforge.toml"), "[run]\nmax_steps = 0\n").unwrap();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings"))
            .stdout(predicate::str::contains("max_steps"));
    }

    #[test]
    fn test_config_validate_reports_ignored_env_values() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .env("MAX_ERRORS", "three")
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ignoring invalid MAX_ERRORS 'three'"));
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = workspace();
        fs::write(dir.path().join("crewforge.toml"), "[run\n").unwrap();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["config", "validate"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Failed to parse crewforge.toml"));
    }
}

// =============================================================================
// Status Command Tests
// =============================================================================

mod status_command {
    use super::*;

    #[test]
    fn test_status_without_projects() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No projects found"));
    }

    #[test]
    fn test_status_shows_checkpoints_and_next_step() {
        let dir = workspace();
        let project = dir.path().join("projects/todo_app");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("PLAN.md"), "# Architecture Plan\n").unwrap();
        fs::write(project.join("TEST_REPORT.md"), "Status: FAILED\n").unwrap();

        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["status", "todo_app"])
            .assert()
            .success()
            .stdout(predicate::str::contains("todo_app"))
            .stdout(predicate::str::contains("(failing)"))
            .stdout(predicate::str::contains("Next: Tester"));
    }

    #[test]
    fn test_status_unknown_project_fails() {
        let dir = workspace();
        crewforge()
            .arg("--workspace")
            .arg(dir.path())
            .args(["status", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }
}
