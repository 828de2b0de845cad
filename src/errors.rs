use std::time::Duration;

use fantoccini::error::{CmdError, NewSessionError};
use thiserror::Error;

/// Errors produced by a monitoring run, grouped by how the run reacts to
/// them. `ElementNotFound` and `Timeout` describe a page state that can
/// legitimately occur (an overlay that never showed up, a control that never
/// became ready); the remaining variants mean the run itself is broken.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Invalid or incomplete run configuration (exit code 2)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Config file or artifact I/O failed (exit code 2)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file did not parse as TOML (exit code 2)
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// No WebDriver session could be established (exit code 4)
    #[error("WebDriver connection failed: {0}")]
    WebDriverFailed(String),

    /// No element matched a locator (exit code 1)
    #[error("No element found matching {0}")]
    ElementNotFound(String),

    /// A wait condition was not met in time (exit code 5)
    #[error("Timed out after {timeout:?} waiting for {condition}")]
    Timeout {
        condition: String,
        timeout: Duration,
    },

    /// The browser session rejected a command mid-run (exit code 1)
    #[error("Browser session error: {0}")]
    Session(String),

    /// The flow completed but the destination page was wrong (exit code 1)
    #[error("Content verification failed: {0}")]
    Verification(String),
}

impl MonitorError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::Config(_) | MonitorError::Io(_) | MonitorError::Toml(_) => 2,
            MonitorError::WebDriverFailed(_) => 4,
            MonitorError::Timeout { .. } => 5,
            _ => 1,
        }
    }

    /// True when the error means "the page does not show this element right
    /// now" rather than a broken session or bad configuration.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            MonitorError::ElementNotFound(_) | MonitorError::Timeout { .. }
        )
    }

    pub(crate) fn timeout(condition: impl Into<String>, timeout: Duration) -> Self {
        MonitorError::Timeout {
            condition: condition.into(),
            timeout,
        }
    }
}

impl From<CmdError> for MonitorError {
    fn from(err: CmdError) -> Self {
        match err {
            CmdError::NoSuchElement(e) => MonitorError::ElementNotFound(e.to_string()),
            other => MonitorError::Session(other.to_string()),
        }
    }
}

impl From<NewSessionError> for MonitorError {
    fn from(err: NewSessionError) -> Self {
        MonitorError::WebDriverFailed(err.to_string())
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
