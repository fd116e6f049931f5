pub mod backend;
pub mod config;
pub mod crew_config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod orchestrator;
pub mod project;
pub mod prompts;
pub mod ui;
pub mod util;
pub mod workers;
