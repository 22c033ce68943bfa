//! Command-line surface

pub mod telemetry;

use std::path::PathBuf;

use clap::Parser;

/// Drive the CSV import workflow end to end.
#[derive(Parser, Clone, Debug)]
#[command(
    name = "csvpilot",
    version,
    about = "Resilient browser-automation orchestration for multi-step CSV imports"
)]
pub struct Cli {
    /// Configuration file (YAML); falls back to config/config.yaml,
    /// then the user config directory
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the import CSV files; overrides the config
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Validate the CSV contracts and print the task list without
    /// opening a browser session
    #[arg(long)]
    pub dry_run: bool,

    /// Write structural HTML snapshots and analysis documents around
    /// every selector resolution
    #[arg(long)]
    pub debug: bool,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
