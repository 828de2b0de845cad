use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::diagnostics::DiagnosticsCollector;
use crate::errors::MonitorError;
use crate::flow::{BranchFinderFlow, Timings};
use crate::session::PageSession;
use crate::webdriver::WebDriverSession;

/// Final word on one monitoring pass.
#[derive(Debug)]
pub struct RunReport {
    /// The flow reached verification and the destination page checked out
    pub passed: bool,
    /// Steps that failed without aborting the sequence
    pub soft_failures: usize,
    /// The hard failure that aborted the sequence, if any
    pub failure: Option<MonitorError>,
    pub duration: Duration,
}

impl RunReport {
    /// A run only counts as clean when it passed with no degraded steps.
    pub fn is_clean(&self) -> bool {
        self.passed && self.soft_failures == 0
    }
}

/// Top-level orchestration: owns the browser session for exactly the span
/// of one run and releases it on every path out.
pub struct MonitorRunner {
    config: RunConfig,
    diagnostics: DiagnosticsCollector,
    timings: Timings,
}

impl MonitorRunner {
    pub fn new(config: RunConfig) -> Self {
        MonitorRunner {
            config,
            diagnostics: DiagnosticsCollector::default(),
            timings: Timings::default(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsCollector) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Start a browser session for the configured kind and run the check.
    /// The only error this returns is failure to acquire the session; once
    /// a session exists, every outcome is a [`RunReport`].
    pub async fn run(&self) -> Result<RunReport, MonitorError> {
        let session = WebDriverSession::launch(&self.config).await?;
        Ok(self.run_with_session(session).await)
    }

    /// Run the check against an already-acquired session. The session is
    /// released exactly once no matter how the flow ends.
    pub async fn run_with_session<S: PageSession>(&self, session: S) -> RunReport {
        let start = Instant::now();

        let mut flow =
            BranchFinderFlow::with_timings(&session, &self.diagnostics, &self.config, self.timings);
        let result = flow.run().await;
        let soft_failures = flow.soft_failures();

        let failure = match result {
            Ok(()) => {
                if soft_failures == 0 {
                    info!("Run passed");
                } else {
                    warn!("Run passed with {} degraded step(s)", soft_failures);
                }
                None
            }
            Err(err) => {
                error!("Run failed: {}", err);
                error!("Failure detail: {:?}", err);
                self.diagnostics.capture(&session, "error_screenshot").await;
                self.diagnostics.capture_raw(&session, "error").await;
                Some(err)
            }
        };

        if let Err(err) = session.quit().await {
            warn!("Failed to close the browser: {}", err);
        } else {
            info!("Browser closed");
        }

        RunReport {
            passed: failure.is_none(),
            soft_failures,
            failure,
            duration: start.elapsed(),
        }
    }
}
