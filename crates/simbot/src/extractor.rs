//! Bounded-retry extraction of the numeric result from a finished report.
//!
//! The JSON report lags the report page: right after a simulation finishes
//! the endpoint may 404 or serve a payload without a mean DPS. Each attempt
//! is a single no-cache GET; failures of any kind are retried with a fixed
//! delay. Exhaustion is not an error: the caller gets an empty result and
//! the last diagnostic so job bookkeeping can still complete.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;

use crate::report::{parse_report, ExtractedResult, ReportUrl};

/// Attempts made before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between attempts. Not applied after the final attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Timeout for a single report request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The service treats non-browser clients differently.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Diagnostic recorded when the result URL carries no report id.
pub const INVALID_URL_DIAGNOSTIC: &str = "Invalid URL ID";

/// Retry policy and report host for [`ReportExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Service the report data is read from, whatever host the result URL
    /// names.
    pub base_url: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: crate::DEFAULT_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Outcome of an extraction run. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// `None` when every attempt came back without a mean DPS.
    pub result: Option<ExtractedResult>,
    /// Number of requests issued.
    pub attempts: u32,
    /// Human-readable description of the last observation.
    pub diagnostic: String,
}

impl Extraction {
    fn invalid_url() -> Self {
        Self {
            result: None,
            attempts: 0,
            diagnostic: INVALID_URL_DIAGNOSTIC.to_string(),
        }
    }
}

/// Resolves a finished-report URL into numbers.
#[async_trait]
pub trait ResultExtractor: Send + Sync {
    async fn extract(&self, result_url: &str) -> Extraction;
}

/// What a single attempt observed.
#[derive(Debug)]
enum Attempt {
    Found(ExtractedResult),
    /// 2xx, but the payload has no mean DPS yet.
    Pending,
    /// 404: the report has not been published yet.
    NotReady,
    /// Any other non-2xx status.
    HttpStatus(u16),
    /// Network or decoding failure.
    Error(String),
}

impl Attempt {
    fn diagnostic(&self) -> String {
        match self {
            Attempt::Found(r) => format!("DPS Found: {}", r.mean_throughput.round()),
            Attempt::Pending => "DPS Not Ready (report pending) - Retrying...".to_string(),
            Attempt::NotReady => "DPS Not Ready (404) - Retrying...".to_string(),
            Attempt::HttpStatus(code) => format!("DPS Fetch Error: {code}"),
            Attempt::Error(msg) => format!("DPS Exception: {msg}"),
        }
    }
}

/// HTTP implementation of [`ResultExtractor`].
pub struct ReportExtractor {
    client: reqwest::Client,
    config: ExtractorConfig,
}

impl ReportExtractor {
    /// Build an extractor with a browser-like user agent.
    pub fn new(config: ExtractorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    async fn try_fetch(&self, data_url: &str) -> Attempt {
        let response = match self
            .client
            .get(data_url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Error(e.to_string()),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Attempt::NotReady;
        }
        if !status.is_success() {
            return Attempt::HttpStatus(status.as_u16());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Error(e.to_string()),
        };

        match parse_report(&body) {
            Ok(Some(result)) => Attempt::Found(result),
            Ok(None) => Attempt::Pending,
            Err(e) => Attempt::Error(format!("invalid report payload: {e}")),
        }
    }
}

#[async_trait]
impl ResultExtractor for ReportExtractor {
    async fn extract(&self, result_url: &str) -> Extraction {
        let Some(report) = ReportUrl::parse(result_url) else {
            tracing::warn!(result_url, "Could not parse report id from result URL");
            return Extraction::invalid_url();
        };

        let data_url = report.data_json_url(&self.config.base_url);
        let max_attempts = self.config.max_attempts.max(1);
        let mut diagnostic = String::new();

        for attempt in 1..=max_attempts {
            let outcome = self.try_fetch(&data_url).await;
            diagnostic = outcome.diagnostic();

            if let Attempt::Found(result) = outcome {
                tracing::info!(
                    report_id = report.id(),
                    attempt,
                    mean_dps = result.mean_throughput,
                    "Report result extracted",
                );
                return Extraction {
                    result: Some(result),
                    attempts: attempt,
                    diagnostic,
                };
            }

            tracing::debug!(
                report_id = report.id(),
                attempt,
                max_attempts,
                diagnostic = %diagnostic,
                "Report result not available yet",
            );

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        tracing::warn!(
            report_id = report.id(),
            attempts = max_attempts,
            diagnostic = %diagnostic,
            "Giving up on report result extraction",
        );

        Extraction {
            result: None,
            attempts: max_attempts,
            diagnostic,
        }
    }
}
