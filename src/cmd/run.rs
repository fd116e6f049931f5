//! Project build orchestration: `crewforge run`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::Path;
use std::sync::Arc;

use super::super::Cli;
use crewforge::orchestrator::{RunOutcome, RunReport, StepKind};

/// Resolve the goal from arguments, prompting when none were given and a
/// user is attached.
pub fn resolve_goal(args: &[String]) -> Result<String> {
    use dialoguer::Input;

    let goal = if args.is_empty() {
        if !console::user_attended() {
            bail!("No goal provided. Pass one as arguments: crewforge run \"Build a todo app\"");
        }
        Input::<String>::new()
            .with_prompt("What do you want to build?")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read goal")?
    } else {
        args.join(" ")
    };

    let goal = goal.trim().to_string();
    if goal.is_empty() {
        bail!("Goal cannot be empty");
    }
    Ok(goal)
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", style("Run Summary").bold());
    println!("  Run:      {}", report.run_id);
    println!("  Project:  {}", report.project_name);
    println!("  Steps:    {}", report.steps);
    println!(
        "  Duration: {}s",
        (report.finished_at - report.started_at).num_seconds()
    );

    if !report.history.is_empty() {
        println!();
        for record in &report.history {
            let status = if record.succeeded {
                style("ok").green()
            } else {
                style("failed").red()
            };
            let kind = match record.kind {
                StepKind::Scheduled => "",
                StepKind::Recovery => " (recovery)",
            };
            println!("  {:>3}  {:<20} {}{}", record.step, record.worker.as_str(), status, kind);
            if let Some(error) = &record.error {
                println!("       {}", style(error).dim());
            }
        }
    }

    let outcome = match &report.outcome {
        RunOutcome::Finished => style("finished".to_string()).green(),
        RunOutcome::Exhausted { steps } => style(format!("exhausted after {} steps", steps)).yellow(),
        RunOutcome::Aborted { last_error } => style(format!("aborted: {}", last_error)).red(),
    };
    println!();
    println!("  Outcome:  {}", outcome);
    println!();
}

pub async fn cmd_run(
    cli: &Cli,
    workspace: &Path,
    goal_args: &[String],
    max_steps: Option<u32>,
    max_failures: Option<u32>,
) -> Result<RunOutcome> {
    use crewforge::backend::GenerationBackend;
    use crewforge::config::Config;
    use crewforge::logging;
    use crewforge::orchestrator::Orchestrator;
    use crewforge::project::Project;
    use crewforge::ui::RunUI;
    use crewforge::workers::standard_registry;

    let goal = resolve_goal(goal_args)?;
    let config = Config::load(workspace, cli.verbose)?.with_limits(max_steps, max_failures);
    let _log_guard = logging::init(&config.log_level, &config.log_file, cli.verbose)?;
    for warning in &config.env_warnings {
        tracing::warn!("{}", warning);
    }

    let project = Project::create(&config.projects_dir, &goal)?;
    tracing::info!(project = %project.name, path = %project.path.display(), goal = %goal, "project ready");

    let backend: Arc<dyn GenerationBackend> = Arc::new(config.backend());
    let registry = standard_registry(backend, config.command_runner());

    let ui = Arc::new(RunUI::new(config.max_steps, cli.verbose));
    ui.show_project(&project.name, &project.path);

    let orchestrator =
        Orchestrator::new(registry, config.max_steps, config.max_failures).with_ui(ui);
    let report = orchestrator.run(&project, &goal).await;

    print_summary(&report);
    Ok(report.outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_from_args_is_joined_and_trimmed() {
        let args = vec!["Build".to_string(), "a".to_string(), "todo app ".to_string()];
        assert_eq!(resolve_goal(&args).unwrap(), "Build a todo app");
    }

    #[test]
    fn test_blank_goal_is_rejected() {
        let args = vec!["  ".to_string()];
        assert!(resolve_goal(&args).is_err());
    }
}
