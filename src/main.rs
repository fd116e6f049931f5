use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "crewforge")]
#[command(version, about = "Multi-agent project builder")]
pub struct Cli {
    /// Show worker detail and info-level logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace holding crewforge.toml, the log file and generated projects
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a project from a goal
    Run {
        /// What to build; prompted for when omitted
        goal: Vec<String>,

        /// Step ceiling for the run
        #[arg(long)]
        max_steps: Option<u32>,

        /// Consecutive failures before the run aborts
        #[arg(long)]
        max_failures: Option<u32>,
    },
    /// Show checkpoints of generated projects
    Status {
        /// Project name (defaults to all projects)
        project: Option<String>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the file and effective configuration
    Show,
    /// Check the configuration for problems
    Validate,
    /// Write a default crewforge.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let workspace = match cli.workspace.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    dotenvy::from_path(workspace.join(".env")).ok();

    match &cli.command {
        Commands::Run {
            goal,
            max_steps,
            max_failures,
        } => {
            let outcome = cmd::cmd_run(&cli, &workspace, goal, *max_steps, *max_failures).await?;
            if !outcome.is_success() {
                std::process::exit(outcome.exit_code());
            }
        }
        Commands::Status { project } => cmd::cmd_status(&workspace, project.as_deref())?,
        Commands::Config { command } => cmd::cmd_config(&workspace, command.clone())?,
    }

    Ok(())
}
