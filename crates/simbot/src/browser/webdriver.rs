//! WebDriver-backed [`Browser`] using `thirtyfour`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use thirtyfour::WindowHandle;

use super::{Browser, BrowserPage, ElementQuery};
use crate::driver::DriverError;

/// WebDriver code point for the Enter key.
const ENTER_KEY: &str = "\u{E007}";

/// Polling interval used while waiting for elements.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

impl FromStr for BrowserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" | "gecko" => Ok(Self::Firefox),
            other => Err(format!("unsupported browser '{other}' (expected chrome or firefox)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    /// WebDriver endpoint (chromedriver, geckodriver or a Selenium hub).
    pub webdriver_url: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            webdriver_url: "http://localhost:4444".to_string(),
        }
    }
}

fn browser_err(e: WebDriverError) -> DriverError {
    DriverError::Browser(e.to_string())
}

/// One WebDriver session shared by every job the worker runs.
pub struct WebDriverBrowser {
    driver: WebDriver,
    home: WindowHandle,
}

impl WebDriverBrowser {
    /// Start a session against the configured WebDriver endpoint.
    pub async fn connect(kind: BrowserKind, cfg: &BrowserConfig) -> Result<Self, DriverError> {
        let driver = match kind {
            BrowserKind::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                if cfg.headless {
                    caps.set_headless().map_err(browser_err)?;
                }
                WebDriver::new(&cfg.webdriver_url, caps)
                    .await
                    .map_err(browser_err)?
            }
            BrowserKind::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if cfg.headless {
                    caps.set_headless().map_err(browser_err)?;
                }
                WebDriver::new(&cfg.webdriver_url, caps)
                    .await
                    .map_err(browser_err)?
            }
        };

        let home = driver.window().await.map_err(browser_err)?;
        tracing::info!(browser = ?kind, url = %cfg.webdriver_url, "WebDriver session started");
        Ok(Self { driver, home })
    }

    /// End the session and close the browser.
    pub async fn quit(self) -> Result<(), DriverError> {
        self.driver.quit().await.map_err(browser_err)
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Page = WebDriverPage;

    async fn open_page(&self) -> Result<WebDriverPage, DriverError> {
        let handle = self.driver.new_tab().await.map_err(browser_err)?;
        self.driver
            .switch_to_window(handle.clone())
            .await
            .map_err(browser_err)?;
        Ok(WebDriverPage {
            driver: self.driver.clone(),
            handle,
            home: self.home.clone(),
        })
    }
}

/// A tab opened by [`WebDriverBrowser::open_page`].
pub struct WebDriverPage {
    driver: WebDriver,
    handle: WindowHandle,
    home: WindowHandle,
}

fn to_by(query: &ElementQuery) -> By {
    match query {
        ElementQuery::Css(s) => By::Css(s.clone()),
        ElementQuery::XPath(s) => By::XPath(s.clone()),
    }
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.driver.goto(url).await.map_err(browser_err)
    }

    async fn wait_for(
        &self,
        query: &ElementQuery,
        timeout: Duration,
    ) -> Result<Option<WebElement>, DriverError> {
        let q = self.driver.query(to_by(query));
        let q = if timeout.is_zero() {
            q.nowait()
        } else {
            q.wait(timeout, ELEMENT_POLL_INTERVAL)
        };
        q.first_opt().await.map_err(browser_err)
    }

    async fn type_text(
        &self,
        element: &WebElement,
        text: &str,
        keystroke_delay: Duration,
    ) -> Result<(), DriverError> {
        for ch in text.chars() {
            element
                .send_keys(ch.to_string())
                .await
                .map_err(browser_err)?;
            tokio::time::sleep(keystroke_delay).await;
        }
        Ok(())
    }

    async fn press_enter(&self, element: &WebElement) -> Result<(), DriverError> {
        element.send_keys(ENTER_KEY).await.map_err(browser_err)
    }

    async fn click(&self, element: &WebElement) -> Result<(), DriverError> {
        let arg = element.to_json().map_err(browser_err)?;
        self.driver
            .execute("arguments[0].click();", vec![arg])
            .await
            .map_err(browser_err)?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), DriverError> {
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await
            .map_err(browser_err)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let url = self.driver.current_url().await.map_err(browser_err)?;
        Ok(url.to_string())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.driver
            .switch_to_window(self.handle.clone())
            .await
            .map_err(browser_err)?;
        self.driver.close_window().await.map_err(browser_err)?;
        self.driver
            .switch_to_window(self.home.clone())
            .await
            .map_err(browser_err)
    }
}
