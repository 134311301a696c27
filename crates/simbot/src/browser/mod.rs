//! Browser abstraction used by the automation driver.
//!
//! [`Browser`] is a long-lived session that hands out pages; [`BrowserPage`]
//! is the handful of interactions the simulation form needs. The WebDriver
//! implementation lives in [`webdriver`]; tests script their own.

pub mod webdriver;

use std::time::Duration;

use async_trait::async_trait;

use crate::driver::DriverError;

/// How to find an element on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementQuery {
    Css(String),
    XPath(String),
}

impl std::fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementQuery::Css(s) => write!(f, "css:{s}"),
            ElementQuery::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// A single open page (tab).
#[async_trait]
pub trait BrowserPage: Send + Sync {
    type Element: Send + Sync;

    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Wait up to `timeout` for `query` to match. A zero timeout checks once.
    async fn wait_for(
        &self,
        query: &ElementQuery,
        timeout: Duration,
    ) -> Result<Option<Self::Element>, DriverError>;

    /// Type `text` one character at a time, pausing `keystroke_delay` between
    /// characters.
    async fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
        keystroke_delay: Duration,
    ) -> Result<(), DriverError>;

    async fn press_enter(&self, element: &Self::Element) -> Result<(), DriverError>;

    /// Activate an element through script rather than a pointer event, so
    /// overlays cannot intercept it.
    async fn click(&self, element: &Self::Element) -> Result<(), DriverError>;

    async fn scroll_to_bottom(&self) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

/// A browser session able to open fresh pages.
#[async_trait]
pub trait Browser: Send + Sync {
    type Page: BrowserPage;

    async fn open_page(&self) -> Result<Self::Page, DriverError>;
}
