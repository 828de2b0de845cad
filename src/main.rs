#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use branchwatch::{logging, MonitorRunner, RunConfig};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_CHECK_FAILED: i32 = 1;

#[derive(Parser)]
#[command(name = "branchwatch")]
#[command(about = "Synthetic check for a bank branch-finder web flow", long_about = None)]
struct Cli {
    /// Path to the TOML run configuration
    #[arg(short, long, default_value = "branchwatch.toml")]
    config: PathBuf,

    /// Run the browser without a window, overriding the config file
    #[arg(long)]
    headless: bool,

    /// Directory receiving the append-only run log
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The guard must outlive the run so buffered file log lines flush
    let guard = match logging::init(&cli.log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            // No subscriber is installed yet, so stderr is all we have
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    };
    let code = run(cli).await;
    drop(guard);

    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let mut config = match RunConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!("Cannot load {}: {}", cli.config.display(), err);
            eprintln!("Error: {}", err);
            return err.exit_code();
        }
    };
    if cli.headless {
        config.headless = true;
    }

    info!("Starting branch-finder check against {}", config.website_url);

    match MonitorRunner::new(config).run().await {
        Ok(report) if report.is_clean() => {
            info!("Check passed in {:.1?}", report.duration);
            EXIT_SUCCESS
        }
        Ok(report) => {
            if let Some(failure) = &report.failure {
                eprintln!("Error: {}", failure);
            }
            error!(
                "Check failed: passed={}, {} degraded step(s), took {:.1?}",
                report.passed, report.soft_failures, report.duration
            );
            EXIT_CHECK_FAILED
        }
        Err(err) => {
            error!("Could not start the check: {}", err);
            eprintln!("Error: {}", err);
            err.exit_code()
        }
    }
}
