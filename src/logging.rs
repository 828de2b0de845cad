use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::MonitorError;

/// File name of the append-only run log inside the log directory
const LOG_FILE: &str = "branchwatch.log";

/// Install the global tracing subscriber.
///
/// Log lines go to stderr for the operator and to `branchwatch.log` under
/// `log_dir` for whoever reads the run after the fact. Returns the guard
/// that flushes the file writer; drop it only once the run is over.
///
/// Fails with a regular [`MonitorError`] when `log_dir` cannot be created
/// or the log file cannot be opened.
pub fn init(log_dir: &Path) -> Result<WorkerGuard, MonitorError> {
    let (file_writer, guard) = open_log_writer(log_dir)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "branchwatch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    Ok(guard)
}

/// Open the non-blocking writer backing the run log file.
fn open_log_writer(log_dir: &Path) -> Result<(NonBlocking, WorkerGuard), MonitorError> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(log_dir)
        .map_err(|err| {
            MonitorError::Config(format!(
                "cannot open {} in {}: {}",
                LOG_FILE,
                log_dir.display(),
                err
            ))
        })?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
#[path = "logging_test.rs"]
mod logging_test;
