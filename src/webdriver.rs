use std::str::FromStr;
use std::time::Duration;

use fantoccini::{Client, ClientBuilder, Locator};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::errors::MonitorError;
use crate::session::{PageElement, PageSession, Target};

/// Supported browser kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum BrowserKind {
    /// Google Chrome via chromedriver
    Chrome,
    /// Microsoft Edge via msedgedriver
    Edge,
}

impl From<String> for BrowserKind {
    /// Resolve a configured browser name. Only `"chrome"` selects Chrome;
    /// every other value falls through to Edge so a run still happens on a
    /// typo, with a warning pointing at the config.
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "chrome" => BrowserKind::Chrome,
            "edge" => BrowserKind::Edge,
            other => {
                warn!("Unrecognized browser '{}' in config, using Edge", other);
                BrowserKind::Edge
            }
        }
    }
}

impl FromStr for BrowserKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BrowserKind::from(s.to_string()))
    }
}

impl BrowserKind {
    /// Get the default WebDriver URL for this browser kind
    pub fn default_webdriver_url(&self) -> &'static str {
        // chromedriver and msedgedriver both listen on 9515 by default
        "http://localhost:9515"
    }

    /// Name of the driver binary, for error messages
    pub fn driver_name(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chromedriver",
            BrowserKind::Edge => "msedgedriver",
        }
    }
}

/// A live browser session over the WebDriver protocol.
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Connect to the configured WebDriver endpoint and start a session.
    pub async fn launch(config: &RunConfig) -> Result<Self, MonitorError> {
        let kind = config.browser;
        let webdriver_url = config
            .webdriver_url
            .clone()
            .unwrap_or_else(|| kind.default_webdriver_url().to_string());

        info!("Connecting to {:?} WebDriver at {}", kind, webdriver_url);

        if !Self::is_webdriver_running(&webdriver_url).await {
            return Err(MonitorError::WebDriverFailed(format!(
                "no WebDriver responding at {}. Start it with: {} --port=9515",
                webdriver_url,
                kind.driver_name()
            )));
        }

        let caps = build_capabilities(kind, config.headless);
        debug!("Session capabilities: {}", json!(caps.clone()));

        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&webdriver_url)
            .await?;

        info!("Browser session established");
        Ok(WebDriverSession { client })
    }

    async fn is_webdriver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url);
        let reply = reqwest::Client::new()
            .get(&status_url)
            .timeout(Duration::from_secs(2))
            .send()
            .await;

        match reply {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

fn build_capabilities(kind: BrowserKind, headless: bool) -> serde_json::Map<String, serde_json::Value> {
    let mut args = vec!["--start-maximized".to_string()];

    if headless {
        // Chromium 112+ headless syntax, accepted by Edge too
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
        // Prevent shared memory issues in containers
        args.push("--disable-dev-shm-usage".to_string());
        args.push("--no-sandbox".to_string());
    }

    let vendor_key = match kind {
        BrowserKind::Chrome => "goog:chromeOptions",
        BrowserKind::Edge => "ms:edgeOptions",
    };

    let mut opts = serde_json::Map::new();
    opts.insert("args".to_string(), json!(args));

    let mut caps = serde_json::Map::new();
    caps.insert(vendor_key.to_string(), json!(opts));
    caps
}

fn locator(target: &Target) -> Locator<'_> {
    match target {
        Target::Css(s) => Locator::Css(s),
        Target::Id(s) => Locator::Id(s),
        Target::LinkText(s) => Locator::LinkText(s),
        Target::XPath(s) => Locator::XPath(s),
    }
}

impl PageSession for WebDriverSession {
    type Element = WebDriverElement;

    async fn navigate(&self, url: &str) -> Result<(), MonitorError> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        // Wait for the document to finish loading before the first lookup
        let wait_script = "return document.readyState === 'complete';";
        for _ in 0..20 {
            // Max 2 seconds
            match self.client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        Ok(())
    }

    async fn find(&self, target: &Target) -> Result<WebDriverElement, MonitorError> {
        let inner = self
            .client
            .find(locator(target))
            .await
            .map_err(|err| match err {
                fantoccini::error::CmdError::NoSuchElement(_) => {
                    MonitorError::ElementNotFound(target.to_string())
                }
                other => other.into(),
            })?;
        Ok(WebDriverElement { inner })
    }

    async fn scroll_into_view(&self, element: &WebDriverElement) -> Result<(), MonitorError> {
        let arg = serde_json::to_value(&element.inner)
            .map_err(|e| MonitorError::Session(e.to_string()))?;
        self.client
            .execute("arguments[0].scrollIntoView(true);", vec![arg])
            .await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, MonitorError> {
        Ok(self.client.source().await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, MonitorError> {
        Ok(self.client.screenshot().await?)
    }

    async fn quit(self) -> Result<(), MonitorError> {
        self.client.close().await?;
        Ok(())
    }
}

/// Element handle backed by a live WebDriver element reference.
pub struct WebDriverElement {
    inner: fantoccini::elements::Element,
}

impl PageElement for WebDriverElement {
    async fn is_displayed(&self) -> Result<bool, MonitorError> {
        Ok(self.inner.is_displayed().await?)
    }

    async fn is_enabled(&self) -> Result<bool, MonitorError> {
        Ok(self.inner.is_enabled().await?)
    }

    async fn click(&self) -> Result<(), MonitorError> {
        Ok(self.inner.click().await?)
    }

    async fn send_keys(&self, text: &str) -> Result<(), MonitorError> {
        Ok(self.inner.send_keys(text).await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, MonitorError> {
        Ok(self.inner.screenshot().await?)
    }
}

#[cfg(test)]
#[path = "webdriver_test.rs"]
mod webdriver_test;
