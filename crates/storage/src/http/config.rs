use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const BASE_URL_VAR: &str = "QUIZ_API_BASE_URL";
pub const TOKEN_VAR: &str = "QUIZ_API_TOKEN";
pub const TIMEOUT_VAR: &str = "QUIZ_API_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid backend url {raw:?}: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend url {0:?} cannot carry a path")]
    OpaqueBaseUrl(String),
    #[error("invalid timeout {0:?}, expected whole seconds")]
    InvalidTimeout(String),
}

/// Where the backend lives and how to talk to it.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl BackendConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s)-style URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Read `QUIZ_API_BASE_URL`, `QUIZ_API_TOKEN` and `QUIZ_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(&base_url)?;

        config.api_token = env::var(TOKEN_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty());

        if let Ok(raw) = env::var(TIMEOUT_VAR) {
            config.timeout = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        raw: raw.to_owned(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::OpaqueBaseUrl(raw.to_owned()));
    }
    Ok(url)
}

/// Parse a timeout given in whole seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidTimeout` for non-numeric or zero values.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_owned())),
    }
}
