use std::time::Duration;

use raidsim_simbot::browser::webdriver::{BrowserConfig, BrowserKind};
use raidsim_simbot::DEFAULT_BASE_URL;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// WebDriver endpoint (geckodriver, chromedriver or a Selenium hub).
    pub webdriver_url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    /// Base URL of the simulation service.
    pub simbot_base_url: String,
    /// Sleep between queue polls when no job is pending.
    pub poll_interval_secs: u64,
    /// Upper bound on waiting for a simulation report.
    pub sim_timeout_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                    |
    /// |----------------------|----------------------------|
    /// | `DATABASE_URL`       | required                   |
    /// | `WEBDRIVER_URL`      | `http://localhost:4444`    |
    /// | `BROWSER`            | `firefox`                  |
    /// | `BROWSER_HEADLESS`   | `false`                    |
    /// | `SIMBOT_BASE_URL`    | `https://www.raidbots.com` |
    /// | `POLL_INTERVAL_SECS` | `10`                       |
    /// | `SIM_TIMEOUT_SECS`   | `300`                      |
    ///
    /// Panics on missing or malformed values so misconfiguration fails at
    /// startup.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let webdriver_url =
            std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| "http://localhost:4444".into());

        let browser: BrowserKind = std::env::var("BROWSER")
            .unwrap_or_else(|_| "firefox".into())
            .parse()
            .unwrap_or_else(|e| panic!("BROWSER is invalid: {e}"));

        let headless = parse_bool(
            &std::env::var("BROWSER_HEADLESS").unwrap_or_else(|_| "false".into()),
        )
        .expect("BROWSER_HEADLESS must be true or false");

        let simbot_base_url =
            std::env::var("SIMBOT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let sim_timeout_secs: u64 = std::env::var("SIM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("SIM_TIMEOUT_SECS must be a valid u64");

        Self {
            database_url,
            webdriver_url,
            browser,
            headless,
            simbot_base_url,
            poll_interval_secs,
            sim_timeout_secs,
        }
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            headless: self.headless,
            webdriver_url: self.webdriver_url.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sim_timeout(&self) -> Duration {
        Duration::from_secs(self.sim_timeout_secs)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 1 "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn durations_derive_from_seconds() {
        let config = WorkerConfig {
            database_url: "postgres://localhost/raidsim".into(),
            webdriver_url: "http://localhost:4444".into(),
            browser: BrowserKind::Firefox,
            headless: true,
            simbot_base_url: DEFAULT_BASE_URL.into(),
            poll_interval_secs: 10,
            sim_timeout_secs: 300,
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.sim_timeout(), Duration::from_secs(300));
        assert!(config.browser_config().headless);
    }
}
