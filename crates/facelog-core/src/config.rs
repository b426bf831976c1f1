//! Client configuration.
//!
//! Configuration is loaded from environment variables:
//!
//! - `FACELOG_API_URL` - backend origin without the `/api` suffix
//!   (default `http://127.0.0.1:8000`)
//! - `FACELOG_HTTP_TIMEOUT_SECS` - per-request timeout, `0` disables it
//!   (default 30)

use std::{env, time::Duration};

use thiserror::Error;
use url::Url;

/// Environment variable holding the backend origin.
pub const API_URL_VAR: &str = "FACELOG_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_VAR: &str = "FACELOG_HTTP_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("Invalid timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),
}

/// Session client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, without the `/api` suffix or a trailing slash.
    api_url: String,
    /// Per-request timeout. `None` leaves the transport default in place.
    timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given backend origin.
    ///
    /// # Errors
    /// Returns error if `api_url` is not an absolute `http(s)` URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            ..Self::default()
        })
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its
    /// value. Unset and blank variables fall back to the defaults.
    ///
    /// # Errors
    /// Returns error if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        match var(API_URL_VAR) {
            Some(url) => config.api_url = parse_api_url(&url)?,
            None => tracing::info!("{API_URL_VAR} not set, using default: {DEFAULT_API_URL}"),
        }

        match var(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            None => tracing::info!(
                "{TIMEOUT_VAR} not set, using default: {}s",
                DEFAULT_TIMEOUT.as_secs()
            ),
        }

        Ok(config)
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-request timeout, `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Backend origin without a trailing slash.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Root that relative targets resolve against: `<origin>/api`.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.api_url())
    }

    /// Resolve a request target to an absolute URL.
    ///
    /// Absolute `http(s)` URLs pass through unchanged. Anything else is
    /// appended to [`api_root`](Self::api_root), inserting a `/` when the
    /// target does not start with one.
    #[must_use]
    pub fn resolve(&self, target: &str) -> String {
        if is_absolute(target) {
            return target.to_string();
        }
        let sep = if target.starts_with('/') { "" } else { "/" };
        format!("{}{sep}{target}", self.api_root())
    }
}

fn is_absolute(target: &str) -> bool {
    Url::parse(target).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn parse_api_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
