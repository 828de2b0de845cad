// Scripted page fakes for driving the monitor without a browser

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use branchwatch::{
    BrowserKind, MonitorError, PageElement, PageSession, RunConfig, SearchTerms, Target, Timings,
};

/// Minimal PNG header; nothing ever decodes what the collector writes
#[allow(dead_code)]
pub const PNG_STUB: &[u8] = b"\x89PNG\r\n\x1a\n";

#[allow(dead_code)]
pub const SITE_URL: &str = "https://www.example-bank.fr/";
#[allow(dead_code)]
pub const LOCATION: &str = "Lyon Perrache";

/// Timings small enough to keep wait-heavy scenarios under a second
#[allow(dead_code)]
pub fn fast_timings() -> Timings {
    Timings {
        cookie_banner: Duration::from_millis(40),
        modal_close: Duration::from_millis(40),
        modal_gone: Duration::from_millis(60),
        interaction: Duration::from_millis(60),
        settle: Duration::from_millis(1),
        poll: Duration::from_millis(5),
    }
}

#[allow(dead_code)]
pub fn test_config() -> RunConfig {
    RunConfig {
        website_url: SITE_URL.to_string(),
        browser: BrowserKind::Chrome,
        location: LOCATION.to_string(),
        webdriver_url: None,
        headless: true,
        search: SearchTerms::default(),
    }
}

/// Locators of the monitored page, spelled out the way the site ships them
#[allow(dead_code)]
pub mod targets {
    use branchwatch::Target;

    pub fn cookie_accept() -> Target {
        Target::xpath("//button[contains(text(), 'Tout accepter')]")
    }

    pub fn modal_close() -> Target {
        Target::css(".js-close-dialog")
    }

    pub fn modal_container() -> Target {
        Target::css(".bpce-modal-animate-container")
    }

    pub fn find_agency() -> Target {
        Target::link_text("Trouver une agence")
    }

    pub fn city_field() -> Target {
        Target::css(".font-text-body-bold")
    }

    pub fn postcode_field() -> Target {
        Target::id("em-searchcity")
    }

    pub fn postcode_field_alt() -> Target {
        Target::css("input[placeholder='Ville / Code postal']")
    }

    pub fn search_button() -> Target {
        Target::xpath("//button[contains(text(), 'Rechercher')]")
    }

    pub fn results_link(location: &str) -> Target {
        Target::link_text(location)
    }

    pub fn body() -> Target {
        Target::css("body")
    }
}

/// Scripted behavior of one element on the fake page.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    pub displayed: bool,
    pub enabled: bool,
    /// Lookups fail until this many attempts have happened
    pub appears_after: usize,
    /// Lookups fail again once this many have succeeded
    pub vanishes_after: Option<usize>,
    pub click_error: Option<String>,
    pub screenshot: Option<Vec<u8>>,
}

impl Default for ElementSpec {
    fn default() -> Self {
        ElementSpec {
            displayed: true,
            enabled: true,
            appears_after: 0,
            vanishes_after: None,
            click_error: None,
            screenshot: Some(PNG_STUB.to_vec()),
        }
    }
}

#[allow(dead_code)]
impl ElementSpec {
    pub fn hidden() -> Self {
        ElementSpec {
            displayed: false,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        ElementSpec {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn appears_after(n: usize) -> Self {
        ElementSpec {
            appears_after: n,
            ..Default::default()
        }
    }

    pub fn vanishes_after(n: usize) -> Self {
        ElementSpec {
            vanishes_after: Some(n),
            ..Default::default()
        }
    }

    pub fn click_fails(message: &str) -> Self {
        ElementSpec {
            click_error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

/// Everything the fake session observed, behind an Arc so tests can keep
/// asserting after `quit()` consumed the session.
#[derive(Default)]
pub struct SessionLog {
    pub navigations: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<String>>,
    pub keys: Mutex<Vec<(String, String)>>,
    pub scrolls: AtomicUsize,
    pub quits: AtomicUsize,
    lookups: Mutex<HashMap<Target, usize>>,
}

#[allow(dead_code)]
impl SessionLog {
    pub fn clicked(&self, target: &Target) -> bool {
        let wanted = target.to_string();
        self.clicks.lock().unwrap().iter().any(|c| c == &wanted)
    }

    pub fn typed_into(&self, target: &Target) -> Option<String> {
        let wanted = target.to_string();
        self.keys
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t == &wanted)
            .map(|(_, text)| text.clone())
    }

    pub fn lookup_count(&self, target: &Target) -> usize {
        self.lookups
            .lock()
            .unwrap()
            .get(target)
            .copied()
            .unwrap_or(0)
    }
}

/// In-memory `PageSession` driven entirely by `ElementSpec`s.
pub struct FakeSession {
    elements: HashMap<Target, ElementSpec>,
    source: String,
    window_screenshot: Option<Vec<u8>>,
    pub log: Arc<SessionLog>,
}

#[allow(dead_code)]
impl FakeSession {
    pub fn new() -> Self {
        FakeSession {
            elements: HashMap::new(),
            source: String::new(),
            window_screenshot: Some(PNG_STUB.to_vec()),
            log: Arc::new(SessionLog::default()),
        }
    }

    /// A page where every step of the flow succeeds for [`LOCATION`].
    pub fn happy_site() -> Self {
        FakeSession::new()
            .with_element(targets::cookie_accept(), ElementSpec::default())
            .with_element(targets::modal_close(), ElementSpec::default())
            // The modal container lingers for two lookups, then animates out
            .with_element(targets::modal_container(), ElementSpec::vanishes_after(2))
            .with_element(targets::find_agency(), ElementSpec::default())
            .with_element(targets::city_field(), ElementSpec::default())
            .with_element(targets::postcode_field(), ElementSpec::default())
            .with_element(targets::search_button(), ElementSpec::default())
            .with_element(targets::results_link(LOCATION), ElementSpec::default())
            .with_element(targets::body(), ElementSpec::default())
            .with_source("<html><body>Agence Perrache - horaires et services</body></html>")
    }

    pub fn with_element(mut self, target: Target, spec: ElementSpec) -> Self {
        self.elements.insert(target, spec);
        self
    }

    pub fn without_element(mut self, target: &Target) -> Self {
        self.elements.remove(target);
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Make the full-window screenshot tier fail
    pub fn without_window_screenshot(mut self) -> Self {
        self.window_screenshot = None;
        self
    }
}

impl PageSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), MonitorError> {
        self.log.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn find(&self, target: &Target) -> Result<FakeElement, MonitorError> {
        let seen = {
            let mut lookups = self.log.lookups.lock().unwrap();
            let count = lookups.entry(target.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let spec = self
            .elements
            .get(target)
            .ok_or_else(|| MonitorError::ElementNotFound(target.to_string()))?;

        if seen <= spec.appears_after {
            return Err(MonitorError::ElementNotFound(target.to_string()));
        }
        if let Some(visible_for) = spec.vanishes_after {
            if seen > spec.appears_after + visible_for {
                return Err(MonitorError::ElementNotFound(target.to_string()));
            }
        }

        Ok(FakeElement {
            target: target.clone(),
            spec: spec.clone(),
            log: Arc::clone(&self.log),
        })
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), MonitorError> {
        self.log.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn page_source(&self) -> Result<String, MonitorError> {
        Ok(self.source.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, MonitorError> {
        self.window_screenshot
            .clone()
            .ok_or_else(|| MonitorError::Session("window screenshot unavailable".to_string()))
    }

    async fn quit(self) -> Result<(), MonitorError> {
        self.log.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Element handle produced by [`FakeSession::find`].
pub struct FakeElement {
    target: Target,
    spec: ElementSpec,
    log: Arc<SessionLog>,
}

impl PageElement for FakeElement {
    async fn is_displayed(&self) -> Result<bool, MonitorError> {
        Ok(self.spec.displayed)
    }

    async fn is_enabled(&self) -> Result<bool, MonitorError> {
        Ok(self.spec.enabled)
    }

    async fn click(&self) -> Result<(), MonitorError> {
        if let Some(message) = &self.spec.click_error {
            return Err(MonitorError::Session(message.clone()));
        }
        self.log
            .clicks
            .lock()
            .unwrap()
            .push(self.target.to_string());
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), MonitorError> {
        self.log
            .keys
            .lock()
            .unwrap()
            .push((self.target.to_string(), text.to_string()));
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, MonitorError> {
        self.spec
            .screenshot
            .clone()
            .ok_or_else(|| MonitorError::Session("element screenshot unavailable".to_string()))
    }
}

/// Every file under `dir` as a sorted list of `/`-separated relative paths
#[allow(dead_code)]
pub fn files_under(dir: &Path) -> Vec<String> {
    fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect(root, &path, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let mut files = Vec::new();
    collect(dir, dir, &mut files);
    files.sort();
    files
}
