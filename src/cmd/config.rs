//! Configuration view and validation commands: `crewforge config`.

use anyhow::Result;
use std::path::Path;

use super::super::ConfigCommands;

fn print_toml(toml: &crewforge::crew_config::CrewToml) {
    println!("[run]");
    println!("  max_steps = {}", toml.run.max_steps);
    println!("  max_failures = {}", toml.run.max_failures);
    println!("  projects_dir = \"{}\"", toml.run.projects_dir.display());
    println!();
    println!("[agent]");
    println!("  command = \"{}\"", toml.agent.command);
    println!("  args = {:?}", toml.agent.args);
    println!("  timeout_secs = {}", toml.agent.timeout_secs);
    println!("  max_retries = {}", toml.agent.max_retries);
    println!("  retry_base_delay_ms = {}", toml.agent.retry_base_delay_ms);
    println!();
    println!("[commands]");
    println!("  timeout_secs = {}", toml.commands.timeout_secs);
    println!();
    println!("[logging]");
    println!("  file = \"{}\"", toml.logging.file.display());
    println!("  level = \"{}\"", toml.logging.level);
    println!();
}

pub fn cmd_config(workspace: &Path, command: Option<ConfigCommands>) -> Result<()> {
    use crewforge::config::Config;
    use crewforge::crew_config::{CONFIG_FILE, CrewToml};

    let config_path = workspace.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Crewforge Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                print_toml(&CrewToml::load(&config_path)?);
            } else {
                println!("No {} found at {}", CONFIG_FILE, config_path.display());
                println!();
                println!("Using default configuration:");
                print_toml(&CrewToml::default());
                println!("Run 'crewforge config init' to create one.");
                println!();
            }

            println!("Effective values (with env overrides):");
            let config = Config::load(workspace, false)?;
            println!("  max_steps = {}", config.max_steps);
            println!("  max_failures = {}", config.max_failures);
            println!("  agent_command = \"{}\"", config.agent_command);
            println!("  projects_dir = {}", config.projects_dir.display());
            println!("  log_file = {}", config.log_file.display());
            println!("  log_level = {}", config.log_level);
            for warning in &config.env_warnings {
                println!("  warning: {}", warning);
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let mut toml = CrewToml::load_or_default(workspace)?;
            let mut warnings = toml.apply_env_overrides();
            warnings.extend(toml.validate());

            if warnings.is_empty() {
                if config_path.exists() {
                    println!("Configuration is valid.");
                } else {
                    println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                }
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            CrewToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [run] max_steps, max_failures, projects_dir");
            println!("  - [agent] command, args, timeout_secs, retries");
            println!("  - [commands] timeout_secs");
            println!("  - [logging] file, level");
            println!();
        }
    }

    Ok(())
}
