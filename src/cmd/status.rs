//! Generated-project checkpoints: `crewforge status`.

use anyhow::{Result, bail};
use console::style;
use serde_json::{Map, Value};
use std::path::Path;

use crewforge::orchestrator::{ArtifactProbe, ArtifactSnapshot, FsArtifactProbe, ProjectContext, decide};
use crewforge::project::Project;
use crewforge::ui::icons::{CHECK, CROSS};

fn mark(done: bool) -> String {
    if done { CHECK.to_string() } else { CROSS.to_string() }
}

/// Next rule-table step for a project on disk, assuming its stack was
/// already chosen. Sequencing that depends on the previous worker is not
/// visible from disk.
pub fn next_step(project: &Project, artifacts: ArtifactSnapshot) -> String {
    let mut recorded = Map::new();
    recorded.insert("recorded".into(), Value::Bool(true));

    let mut ctx = ProjectContext::new(&project.name, &project.path, "");
    ctx.language_config = Some(recorded);
    ctx.artifacts = artifacts;
    decide(&ctx).next.to_string()
}

fn print_project(project: &Project) {
    let artifacts = FsArtifactProbe.snapshot(&project.path);

    println!("{} {}", style(&project.name).bold(), style(project.path.display()).dim());
    println!("  {}PLAN.md", mark(artifacts.plan_exists));
    let report = match (artifacts.test_report_exists(), artifacts.tests_failed()) {
        (false, _) => "TEST_REPORT.md".to_string(),
        (true, false) => format!("TEST_REPORT.md {}", style("(passing)").green()),
        (true, true) => format!("TEST_REPORT.md {}", style("(failing)").red()),
    };
    println!("  {}{}", mark(artifacts.test_report_exists()), report);
    println!("  {}README.md", mark(artifacts.docs_exist));
    println!("  {}git repository", mark(artifacts.vcs_initialized));
    println!("  Next: {}", style(next_step(project, artifacts)).cyan());
    println!();
}

pub fn cmd_status(workspace: &Path, name: Option<&str>) -> Result<()> {
    use crewforge::config::Config;

    let config = Config::load(workspace, false)?;

    match name {
        Some(name) => {
            let path = config.projects_dir.join(name);
            if !path.is_dir() {
                bail!("Project '{}' not found in {}", name, config.projects_dir.display());
            }
            println!();
            print_project(&Project::at(path));
        }
        None => {
            let projects = Project::list(&config.projects_dir)?;
            if projects.is_empty() {
                println!("No projects found in {}", config.projects_dir.display());
                return Ok(());
            }
            println!();
            for project in &projects {
                print_project(project);
            }
        }
    }

    Ok(())
}
