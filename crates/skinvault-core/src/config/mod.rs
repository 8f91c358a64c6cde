//! Client configuration for skinvault interfaces.
//!
//! Provides a unified `ClientConfig` used by the CLI (and any other front end)
//! to locate the case-opening API and tune connectivity monitoring.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Default liveness polling interval
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5;
/// Default per-request timeout for remote calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_BASE_URL: &str = "SKINVAULT_API_BASE_URL";
pub const ENV_PROBE_INTERVAL_SECS: &str = "SKINVAULT_PROBE_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SKINVAULT_REQUEST_TIMEOUT_SECS";

/// Connection settings for the remote authority.
///
/// No credentials live here; the bearer token is supplied separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the case-opening API; `None` runs fully offline
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Normalize and validate the configuration.
    ///
    /// The base URL is trimmed and stripped of trailing slashes; durations
    /// must be non-zero.
    pub fn validated(mut self) -> Result<Self> {
        self.api_base_url = match normalize_text_option(self.api_base_url.take()) {
            Some(url) => Some(normalize_base_url(&url)?),
            None => None,
        };
        if self.probe_interval_secs == 0 {
            return Err(Error::InvalidInput(
                "probe_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Apply `SKINVAULT_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup, then validate.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(lookup(ENV_API_BASE_URL)) {
            self.api_base_url = Some(url);
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_PROBE_INTERVAL_SECS)) {
            self.probe_interval_secs = parse_secs(ENV_PROBE_INTERVAL_SECS, &raw)?;
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_REQUEST_TIMEOUT_SECS)) {
            self.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
        }
        self.validated()
    }
}

/// Parse a client configuration from a raw JSON payload.
pub fn parse_client_config(payload: &str) -> Result<ClientConfig> {
    let config: ClientConfig = serde_json::from_str(payload)
        .map_err(|error| Error::InvalidInput(format!("invalid client config JSON: {error}")))?;
    config.validated()
}

/// Trim a base URL and require an http(s) scheme.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let value = raw.trim();
    if is_http_url(value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(format!(
            "api base URL '{value}' must include http:// or https://"
        )))
    }
}

const fn default_probe_interval_secs() -> u64 {
    DEFAULT_PROBE_INTERVAL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| Error::InvalidInput(format!("{key} must be a whole number of seconds")))
}
