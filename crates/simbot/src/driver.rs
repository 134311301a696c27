//! Drives the simulation service's web form and waits for the finished
//! report.
//!
//! A run always happens in a freshly opened page, and that page is always
//! closed before [`AutomationDriver::run`] returns, whatever the outcome.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::browser::{Browser, BrowserPage, ElementQuery};
use crate::locator::{labelled_input, locate_first, submit_locators};
use crate::report::is_report_location;

/// Path of the quick-simulation form.
pub const QUICK_SIM_PATH: &str = "/simbot/quick";

/// Cookie consent banner button. Clicked if present.
const CONSENT_BUTTON: &str = "button[class*=\"Consent\"]";

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Form field '{field}' not found")]
    FieldNotFound { field: &'static str },

    #[error("Run button not found")]
    SubmitNotFound,

    #[error("Timed out after {}s waiting for the simulation report", .waited.as_secs())]
    Timeout { waited: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

/// The subject to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRequest {
    pub name: String,
    pub realm: String,
    pub region: String,
}

impl SimRequest {
    /// The quick-sim form URL with the subject prefilled as query parameters.
    pub fn quick_sim_url(&self, base_url: &str) -> Result<String, DriverError> {
        let mut url = Url::parse(base_url)
            .and_then(|u| u.join(QUICK_SIM_PATH))
            .map_err(|e| DriverError::InvalidUrl(format!("{base_url}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("region", &self.region)
            .append_pair("realm", &self.realm)
            .append_pair("character", &self.name);
        Ok(url.into())
    }
}

/// Requests a simulation and returns the finished-report URL.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    async fn run(&self, request: &SimRequest) -> Result<String, DriverError>;
}

/// Waits and pauses used while driving the form.
#[derive(Debug, Clone)]
pub struct DriverTimings {
    /// Pause after navigation for the page to hydrate.
    pub hydrate: Duration,
    /// How long to wait for each form field to appear.
    pub field_wait: Duration,
    pub keystroke: Duration,
    /// Pause after typing so autocomplete can settle.
    pub settle: Duration,
    /// Pause after filling the form for layout to stabilise.
    pub layout: Duration,
    /// How long each text-based submit locator waits.
    pub submit_wait: Duration,
    pub report_poll: Duration,
    /// Upper bound on the wait for the report page.
    pub report_timeout: Duration,
}

impl Default for DriverTimings {
    fn default() -> Self {
        Self {
            hydrate: Duration::from_secs(2),
            field_wait: Duration::from_secs(5),
            keystroke: Duration::from_millis(100),
            settle: Duration::from_secs(1),
            layout: Duration::from_secs(2),
            submit_wait: Duration::from_secs(5),
            report_poll: Duration::from_secs(1),
            report_timeout: Duration::from_secs(300),
        }
    }
}

/// [`AutomationDriver`] over any [`Browser`].
pub struct SimulationDriver<B> {
    browser: B,
    base_url: String,
    timings: DriverTimings,
}

impl<B: Browser> SimulationDriver<B> {
    pub fn new(browser: B, base_url: impl Into<String>) -> Self {
        Self::with_timings(browser, base_url, DriverTimings::default())
    }

    pub fn with_timings(browser: B, base_url: impl Into<String>, timings: DriverTimings) -> Self {
        Self {
            browser,
            base_url: base_url.into(),
            timings,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser
    }

    async fn drive(&self, page: &B::Page, request: &SimRequest) -> Result<String, DriverError> {
        let t = &self.timings;

        page.goto(&request.quick_sim_url(&self.base_url)?).await?;
        tokio::time::sleep(t.hydrate).await;

        self.fill_field(page, "Realm", &request.realm).await?;
        self.fill_field(page, "Character", &request.name).await?;
        tokio::time::sleep(t.layout).await;

        self.dismiss_consent(page).await;
        page.scroll_to_bottom().await?;

        let Some((locator, button)) =
            locate_first(page, &submit_locators(t.submit_wait)).await?
        else {
            return Err(DriverError::SubmitNotFound);
        };
        tracing::debug!(locator, "Submit control located");
        page.click(&button).await?;

        self.wait_for_report(page).await
    }

    async fn fill_field(
        &self,
        page: &B::Page,
        field: &'static str,
        value: &str,
    ) -> Result<(), DriverError> {
        let t = &self.timings;
        let input = page
            .wait_for(&labelled_input(field), t.field_wait)
            .await?
            .ok_or(DriverError::FieldNotFound { field })?;
        page.type_text(&input, value, t.keystroke).await?;
        tokio::time::sleep(t.settle).await;
        page.press_enter(&input).await
    }

    async fn dismiss_consent(&self, page: &B::Page) {
        let query = ElementQuery::Css(CONSENT_BUTTON.to_string());
        match page.wait_for(&query, Duration::ZERO).await {
            Ok(Some(button)) => {
                if let Err(e) = page.click(&button).await {
                    tracing::debug!(error = %e, "Consent banner click failed");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "Consent banner lookup failed"),
        }
    }

    async fn wait_for_report(&self, page: &B::Page) -> Result<String, DriverError> {
        let t = &self.timings;
        let deadline = tokio::time::Instant::now() + t.report_timeout;
        loop {
            let location = page.current_url().await?;
            if is_report_location(&location) {
                return Ok(location);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    waited: t.report_timeout,
                });
            }
            tokio::time::sleep(t.report_poll).await;
        }
    }
}

#[async_trait]
impl<B: Browser> AutomationDriver for SimulationDriver<B> {
    async fn run(&self, request: &SimRequest) -> Result<String, DriverError> {
        let page = self.browser.open_page().await?;
        let outcome = self.drive(&page, request).await;
        if let Err(e) = page.close().await {
            tracing::warn!(error = %e, "Failed to close simulation page");
        }
        match &outcome {
            Ok(url) => tracing::info!(
                character = %request.name,
                realm = %request.realm,
                report_url = %url,
                "Simulation finished",
            ),
            Err(e) => tracing::warn!(
                character = %request.name,
                realm = %request.realm,
                error = %e,
                "Simulation run failed",
            ),
        }
        outcome
    }
}
