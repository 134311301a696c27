use std::sync::Arc;

use raidsim_core::access::{AccessPolicy, AdminRolePolicy, UsernameAllowList};
use raidsim_simbot::DEFAULT_BASE_URL;

use crate::auth::jwt::JwtConfig;

/// Default domain inbound completion messages must originate from.
pub const DEFAULT_TRUSTED_MESSAGE_DOMAIN: &str = "raidbots.com";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Completion requests wait for report
    /// extraction, so this must exceed the extractor's worst case.
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Inbound completion messages must come from this domain or a subdomain.
    pub trusted_message_domain: String,
    /// Simulation service that report data is fetched from.
    pub simbot_base_url: String,
    /// When non-empty, only these usernames are privileged. Otherwise the
    /// admin role is.
    pub privileged_usernames: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `60`                       |
    /// | `TRUSTED_MESSAGE_DOMAIN` | `raidbots.com`             |
    /// | `SIMBOT_BASE_URL`        | `https://www.raidbots.com` |
    /// | `PRIVILEGED_USERNAMES`   | empty (admin role)         |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = split_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let trusted_message_domain = std::env::var("TRUSTED_MESSAGE_DOMAIN")
            .unwrap_or_else(|_| DEFAULT_TRUSTED_MESSAGE_DOMAIN.into());

        let simbot_base_url =
            std::env::var("SIMBOT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let privileged_usernames =
            split_list(&std::env::var("PRIVILEGED_USERNAMES").unwrap_or_default());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            trusted_message_domain,
            simbot_base_url,
            privileged_usernames,
        }
    }

    /// The privileged-caller policy this configuration selects.
    pub fn access_policy(&self) -> Arc<dyn AccessPolicy> {
        let allow_list = UsernameAllowList::new(&self.privileged_usernames);
        if allow_list.is_empty() {
            Arc::new(AdminRolePolicy)
        } else {
            Arc::new(allow_list)
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
