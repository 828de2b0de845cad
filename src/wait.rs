use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::MonitorError;
use crate::session::{PageElement, PageSession, Target};

/// Default pause between condition polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Bounded polling against the live page. Every DOM-dependent step goes
/// through one of these conditions instead of sleeping blind; a condition
/// that is already true returns without waiting a full poll interval.
#[derive(Debug, Clone, Copy)]
pub struct WaitGate {
    poll: Duration,
}

impl Default for WaitGate {
    fn default() -> Self {
        WaitGate {
            poll: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitGate {
    pub fn new(poll: Duration) -> Self {
        WaitGate { poll }
    }

    /// Wait until an element matching `target` exists in the DOM.
    pub async fn present<S: PageSession>(
        &self,
        session: &S,
        target: &Target,
        timeout: Duration,
    ) -> Result<S::Element, MonitorError> {
        let deadline = Instant::now() + timeout;
        loop {
            match session.find(target).await {
                Ok(element) => return Ok(element),
                Err(err) if Instant::now() >= deadline => {
                    debug!("Giving up on {}: {}", target, err);
                    return Err(MonitorError::timeout(
                        format!("presence of {}", target),
                        timeout,
                    ));
                }
                // Transient lookup failures count as not-yet-present
                Err(_) => tokio::time::sleep(self.poll).await,
            }
        }
    }

    /// Wait until an element matching `target` is displayed and enabled.
    pub async fn clickable<S: PageSession>(
        &self,
        session: &S,
        target: &Target,
        timeout: Duration,
    ) -> Result<S::Element, MonitorError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = session.find(target).await {
                let displayed = element.is_displayed().await.unwrap_or(false);
                let enabled = element.is_enabled().await.unwrap_or(false);
                if displayed && enabled {
                    return Ok(element);
                }
            }
            if Instant::now() >= deadline {
                return Err(MonitorError::timeout(
                    format!("{} to become clickable", target),
                    timeout,
                ));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Wait until nothing matches `target` any more. An element that never
    /// existed satisfies the condition immediately; a failing lookup is the
    /// success signal here, not an error.
    pub async fn gone<S: PageSession>(
        &self,
        session: &S,
        target: &Target,
        timeout: Duration,
    ) -> Result<(), MonitorError> {
        let deadline = Instant::now() + timeout;
        loop {
            if session.find(target).await.is_err() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(MonitorError::timeout(
                    format!("removal of {}", target),
                    timeout,
                ));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Try an ordered list of locators for the same logical element, giving
    /// each its own full timeout window, and return the first hit.
    pub async fn first_present<S: PageSession>(
        &self,
        session: &S,
        targets: &[Target],
        timeout: Duration,
    ) -> Result<S::Element, MonitorError> {
        let mut last_err = None;
        for (i, target) in targets.iter().enumerate() {
            match self.present(session, target, timeout).await {
                Ok(element) => return Ok(element),
                Err(err) => {
                    if i + 1 < targets.len() {
                        warn!("Element not found by {}, trying alternative locator", target);
                    }
                    last_err = Some(err);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| MonitorError::ElementNotFound("empty locator chain".to_string())))
    }
}
