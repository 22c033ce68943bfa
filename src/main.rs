use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use csvpilot_cli::cli::telemetry;
use csvpilot_cli::{app, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // File logging starts before the config is read, so its location
    // is fixed; the JSON report honors the configured logs directory.
    // Dry runs stay side-effect free and log to the console only.
    let log_dir = (!cli.dry_run).then_some(Path::new("logs"));
    let _guard = match telemetry::init_logging(&cli.log_level, log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("fatal: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match app::run(cli).await {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "run aborted");
            eprintln!("fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}
