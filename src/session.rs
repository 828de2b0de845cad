use std::fmt;

use crate::errors::MonitorError;

/// How an element is looked up on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// CSS selector
    Css(String),
    /// Element id attribute
    Id(String),
    /// Exact anchor text
    LinkText(String),
    /// XPath expression
    XPath(String),
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Target::Css(selector.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Target::Id(id.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Target::LinkText(text.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Target::XPath(expr.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Css(s) => write!(f, "css '{}'", s),
            Target::Id(s) => write!(f, "id '{}'", s),
            Target::LinkText(s) => write!(f, "link text '{}'", s),
            Target::XPath(s) => write!(f, "xpath '{}'", s),
        }
    }
}

/// A handle to one element in a live page.
#[allow(async_fn_in_trait)]
pub trait PageElement {
    async fn is_displayed(&self) -> Result<bool, MonitorError>;
    async fn is_enabled(&self) -> Result<bool, MonitorError>;
    async fn click(&self) -> Result<(), MonitorError>;
    async fn send_keys(&self, text: &str) -> Result<(), MonitorError>;
    /// PNG screenshot of just this element.
    async fn screenshot(&self) -> Result<Vec<u8>, MonitorError>;
}

/// One live browser session. The flow and the diagnostics layer only ever
/// talk to the browser through this trait, so tests can substitute a
/// scripted page.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    type Element: PageElement;

    /// Navigate to `url` and wait for the document to finish loading.
    async fn navigate(&self, url: &str) -> Result<(), MonitorError>;

    /// Look the target up in the current DOM. Returns
    /// [`MonitorError::ElementNotFound`] when nothing matches.
    async fn find(&self, target: &Target) -> Result<Self::Element, MonitorError>;

    /// Scroll until the element is inside the viewport.
    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), MonitorError>;

    /// Full HTML source of the current page.
    async fn page_source(&self) -> Result<String, MonitorError>;

    /// PNG screenshot of the full window.
    async fn screenshot(&self) -> Result<Vec<u8>, MonitorError>;

    /// Release the session. Takes ownership so a session cannot be used, or
    /// released again, afterwards.
    async fn quit(self) -> Result<(), MonitorError>;
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
