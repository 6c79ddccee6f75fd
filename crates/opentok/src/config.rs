//! OpenTok client configuration.
//!
//! The API key, API secret and base URL are fixed when the client is built
//! and never change afterwards. The secret is held as a [`SecretString`] and
//! redacted in Debug output.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default production endpoint.
pub const DEFAULT_API_URL: &str = "https://api.opentok.com";

/// Default HTTP request timeout for the bundled transport.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration shared by every component.
#[derive(Clone)]
pub struct OpenTokConfig {
    /// Partner id. Embedded in session ids, tokens and resource paths.
    pub api_key: String,

    /// Shared secret used for token signing and partner authentication.
    pub api_secret: SecretString,

    /// Base URL of the REST backend, without trailing slash.
    pub api_url: String,

    /// Request timeout applied by `ReqwestTransport`.
    pub http_timeout: Duration,
}

impl fmt::Debug for OpenTokConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenTokConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidTimeout(String),
}

impl OpenTokConfig {
    /// Create a configuration pointing at the production endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Override the backend endpoint.
    ///
    /// Accepts either a full URL or a bare host (`api.opentok.com`), which is
    /// assumed to be HTTPS.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl AsRef<str>) -> Self {
        self.api_url = normalize_api_url(api_url.as_ref());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Value of the `X-TB-PARTNER-AUTH` header.
    #[must_use]
    pub fn partner_auth(&self) -> String {
        format!("{}:{}", self.api_key, self.api_secret.expose_secret())
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`OpenTokConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// Reads `OPENTOK_API_KEY` and `OPENTOK_API_SECRET` (required),
    /// `OPENTOK_API_URL` and `OPENTOK_HTTP_TIMEOUT_SECONDS` (optional).
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingEnvVar` if a required variable is absent
    /// - `ConfigError::InvalidTimeout` if the timeout is not a positive integer
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("OPENTOK_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENTOK_API_KEY".to_string()))?;

        let api_secret = vars
            .get("OPENTOK_API_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENTOK_API_SECRET".to_string()))?;

        let mut config = Self::new(api_key.clone(), api_secret.clone());

        if let Some(url) = vars.get("OPENTOK_API_URL") {
            config = config.with_api_url(url);
        }

        if let Some(value_str) = vars.get("OPENTOK_HTTP_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTimeout(format!(
                    "OPENTOK_HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidTimeout(
                    "OPENTOK_HTTP_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            config = config.with_http_timeout(Duration::from_secs(value));
        }

        Ok(config)
    }
}

fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
