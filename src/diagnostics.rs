use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::errors::MonitorError;
use crate::session::{PageElement, PageSession, Target};

/// Record of one screenshot written to disk. The monitor never reads these
/// back; they exist for whoever investigates a failed run.
#[derive(Debug, Clone)]
pub struct DiagnosticArtifact {
    pub name: String,
    pub captured_at: DateTime<Utc>,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Best-effort screenshot capture with two tiers: a full-window WebDriver
/// capture into the images directory, and an element-level capture of the
/// page body when the full-window one is unavailable. Capture never fails
/// the caller; a monitor must not crash while explaining a failure.
#[derive(Debug, Clone)]
pub struct DiagnosticsCollector {
    images_dir: PathBuf,
    fallback_dir: PathBuf,
}

impl Default for DiagnosticsCollector {
    fn default() -> Self {
        DiagnosticsCollector {
            images_dir: PathBuf::from("images"),
            fallback_dir: PathBuf::from("."),
        }
    }
}

impl DiagnosticsCollector {
    pub fn new(images_dir: impl AsRef<Path>, fallback_dir: impl AsRef<Path>) -> Self {
        DiagnosticsCollector {
            images_dir: images_dir.as_ref().to_path_buf(),
            fallback_dir: fallback_dir.as_ref().to_path_buf(),
        }
    }

    /// Capture a full-window screenshot as `{name}.png` in the images
    /// directory. If that fails, fall back to an element capture written as
    /// `{name}_fallback.png` next to the logs. Errors are logged, never
    /// returned; the record of the capture that landed (if any) comes back.
    pub async fn capture<S: PageSession>(
        &self,
        session: &S,
        name: &str,
    ) -> Option<DiagnosticArtifact> {
        match self.full_window(session, name).await {
            Ok(artifact) => {
                info!("Saved screenshot to {}", artifact.path.display());
                Some(artifact)
            }
            Err(err) => {
                error!("Failed to take screenshot '{}': {}", name, err);
                self.capture_raw(session, &format!("{}_fallback", name)).await
            }
        }
    }

    /// Capture through the fallback tier only: an element screenshot of the
    /// page body written as `{name}.png` in the fallback directory. Used
    /// directly for the last-resort capture when a run dies.
    pub async fn capture_raw<S: PageSession>(
        &self,
        session: &S,
        name: &str,
    ) -> Option<DiagnosticArtifact> {
        match self.body_element(session, name).await {
            Ok(artifact) => {
                info!("Saved fallback screenshot to {}", artifact.path.display());
                Some(artifact)
            }
            Err(err) => {
                error!("Fallback screenshot '{}' also failed: {}", name, err);
                None
            }
        }
    }

    async fn full_window<S: PageSession>(
        &self,
        session: &S,
        name: &str,
    ) -> Result<DiagnosticArtifact, MonitorError> {
        let data = session.screenshot().await?;
        std::fs::create_dir_all(&self.images_dir)?;
        let path = self.images_dir.join(format!("{}.png", name));
        std::fs::write(&path, &data)?;
        Ok(self.record(name, path, data.len()))
    }

    async fn body_element<S: PageSession>(
        &self,
        session: &S,
        name: &str,
    ) -> Result<DiagnosticArtifact, MonitorError> {
        let body = session.find(&Target::css("body")).await?;
        let data = body.screenshot().await?;
        std::fs::create_dir_all(&self.fallback_dir)?;
        let path = self.fallback_dir.join(format!("{}.png", name));
        std::fs::write(&path, &data)?;
        Ok(self.record(name, path, data.len()))
    }

    fn record(&self, name: &str, path: PathBuf, bytes: usize) -> DiagnosticArtifact {
        let artifact = DiagnosticArtifact {
            name: name.to_string(),
            captured_at: Utc::now(),
            path,
            bytes,
        };
        debug!(
            "Captured '{}' at {} ({} bytes)",
            artifact.name, artifact.captured_at, artifact.bytes
        );
        artifact
    }
}
