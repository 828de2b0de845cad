use std::path::Path;

use serde::Deserialize;

use crate::errors::MonitorError;
use crate::webdriver::BrowserKind;

/// Immutable run configuration, loaded once at startup.
///
/// ```toml
/// website_url = "https://www.example-bank.fr/"
/// browser = "chrome"
/// location = "Lyon Perrache"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Page hosting the branch-finder entry point
    pub website_url: String,
    /// Which browser to drive; `"chrome"` for Chrome, anything else for Edge
    pub browser: BrowserKind,
    /// Exact link text of the branch to select from the search results
    pub location: String,
    /// WebDriver endpoint override
    #[serde(default)]
    pub webdriver_url: Option<String>,
    /// Run the browser without a window
    #[serde(default)]
    pub headless: bool,
    /// Terms typed into the branch search form
    #[serde(default)]
    pub search: SearchTerms,
}

/// What gets typed into the search form before submitting.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTerms {
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_postcode")]
    pub postcode: String,
}

impl Default for SearchTerms {
    fn default() -> Self {
        SearchTerms {
            city: default_city(),
            postcode: default_postcode(),
        }
    }
}

fn default_city() -> String {
    "Lyon".to_string()
}

fn default_postcode() -> String {
    "69000".to_string()
}

impl RunConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse and validate config from TOML text.
    pub fn parse(text: &str) -> Result<Self, MonitorError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MonitorError> {
        url::Url::parse(&self.website_url)
            .map_err(|e| MonitorError::Config(format!("website_url '{}': {}", self.website_url, e)))?;

        if self.location.trim().is_empty() {
            return Err(MonitorError::Config(
                "location must not be empty".to_string(),
            ));
        }
        if self.search.city.trim().is_empty() || self.search.postcode.trim().is_empty() {
            return Err(MonitorError::Config(
                "search.city and search.postcode must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
