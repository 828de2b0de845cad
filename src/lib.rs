//! # branchwatch
#![allow(clippy::uninlined_format_args)]
//!
//! Synthetic monitor for a bank's "find a branch" web flow.
//!
//! One run is one pass through the real site: load the page, clear the
//! cookie banner and the welcome modal, open the agency finder, search for a
//! city, pick the configured branch, and verify the destination page
//! mentions it. Failures leave screenshots under `images/` and ERROR log
//! lines with enough detail to reconstruct the run afterwards.
//!
//! The binary reads a small TOML config:
//!
//! ```toml
//! website_url = "https://www.example-bank.fr/"
//! browser = "chrome"
//! location = "Lyon Perrache"
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use branchwatch::{MonitorRunner, RunConfig};
//!
//! # async fn example() -> Result<(), branchwatch::MonitorError> {
//! let config = RunConfig::load("branchwatch.toml")?;
//! let report = MonitorRunner::new(config).run().await?;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```
//!
//! Everything between the runner and the browser goes through the
//! [`PageSession`] trait, so the whole flow is testable against a scripted
//! page without a WebDriver endpoint.

/// Run configuration loaded from a TOML file
pub mod config;

/// Best-effort screenshot capture with a fallback tier
pub mod diagnostics;

/// Error taxonomy and exit codes
pub mod errors;

/// The branch-finder navigation sequence
pub mod flow;

/// Tracing subscriber and run-log file setup
pub mod logging;

/// Top-level orchestration and the run verdict
pub mod runner;

/// Capability traits the flow drives the browser through
pub mod session;

/// Bounded condition polling against the live page
pub mod wait;

/// WebDriver-backed session implementation
pub mod webdriver;

pub use config::{RunConfig, SearchTerms};
pub use diagnostics::{DiagnosticArtifact, DiagnosticsCollector};
pub use errors::MonitorError;
pub use flow::{BranchFinderFlow, Step, StepOutcome, Timings};
pub use runner::{MonitorRunner, RunReport};
pub use session::{PageElement, PageSession, Target};
pub use wait::WaitGate;
pub use webdriver::{BrowserKind, WebDriverSession};
