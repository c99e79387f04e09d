//! Endpoint and timeout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default authorization endpoint.
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:8080/auth";

/// Default add-TAIL endpoint.
pub const DEFAULT_ADD_TAIL_URL: &str = "http://127.0.0.1:8080/addTail";

/// Remote service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Base URL of the authorization service; the asset hash is appended
    pub auth_url: String,
    /// Add-TAIL endpoint of the registry
    pub add_tail_url: String,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
    /// TCP connect timeout
    pub connect_timeout_secs: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            add_tail_url: DEFAULT_ADD_TAIL_URL.to_string(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

impl RegistrationConfig {
    /// Read `TAIL_AUTH_URL`, `TAIL_ADD_URL`, `TAIL_REQUEST_TIMEOUT_SECS` and
    /// `TAIL_CONNECT_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let seconds = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
                None => Ok(default),
            }
        };

        Ok(Self {
            auth_url: lookup("TAIL_AUTH_URL").unwrap_or(defaults.auth_url),
            add_tail_url: lookup("TAIL_ADD_URL").unwrap_or(defaults.add_tail_url),
            request_timeout_secs: seconds(
                "TAIL_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            connect_timeout_secs: seconds(
                "TAIL_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
        })
    }

    /// Point both endpoints at `base`, as `{base}/auth` and `{base}/addTail`.
    pub fn for_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/auth"),
            add_tail_url: format!("{base}/addTail"),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_endpoint("auth_url", &self.auth_url)?;
        check_endpoint("add_tail_url", &self.add_tail_url)?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout_secs cannot be 0".into(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "connect_timeout_secs cannot be 0".into(),
            ));
        }
        Ok(())
    }
}

fn check_endpoint(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingEndpoint(name));
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidEndpoint {
            name,
            value: value.to_string(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEndpoint(&'static str),

    #[error("{name} must be an http(s) URL, got {value:?}")]
    InvalidEndpoint { name: &'static str, value: String },

    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}
