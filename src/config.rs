//! Builder configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DEPLOY_FUNCTION, DEFAULT_HISTORY_CAP, DEFAULT_HISTORY_DEBOUNCE_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::notice::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        "E_CONFIG_MISSING"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Base URL of the remote service, without trailing slash.
    pub service_url: String,
    /// Public API key sent with every request.
    pub service_key: String,
    /// Access token of a signed-in user, if provided up front.
    pub access_token: Option<String>,
    pub history_debounce_ms: u64,
    pub history_cap: usize,
    /// Server-side function fronting the deployment platform.
    pub deploy_function: String,
    pub timeouts: ServiceTimeouts,
}

impl BuilderConfig {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `SERVICE_URL`
    /// - `SERVICE_KEY`
    ///
    /// Optional:
    /// - `SERVICE_ACCESS_TOKEN`
    /// - `HISTORY_DEBOUNCE_MS`: default 2000
    /// - `HISTORY_CAP`: default 50
    /// - `DEPLOY_FUNCTION`: default `vercel`
    /// - `SERVICE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SERVICE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when a required variable is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from any key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when a required variable is unset or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let parse_or = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let service_url = required("SERVICE_URL")?.trim_end_matches('/').to_string();
        let service_key = required("SERVICE_KEY")?;
        let access_token = lookup("SERVICE_ACCESS_TOKEN").filter(|v| !v.trim().is_empty());
        let history_cap = lookup("HISTORY_CAP")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|cap| *cap > 0)
            .unwrap_or(DEFAULT_HISTORY_CAP);
        let deploy_function = lookup("DEPLOY_FUNCTION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DEPLOY_FUNCTION.to_string());

        Ok(Self {
            service_url,
            service_key,
            access_token,
            history_debounce_ms: parse_or("HISTORY_DEBOUNCE_MS", DEFAULT_HISTORY_DEBOUNCE_MS),
            history_cap,
            deploy_function,
            timeouts: ServiceTimeouts {
                request_secs: parse_or("SERVICE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: parse_or("SERVICE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        })
    }

    /// Config for a service at `service_url` with every optional value defaulted.
    #[must_use]
    pub fn new(service_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            service_key: service_key.into(),
            access_token: None,
            history_debounce_ms: DEFAULT_HISTORY_DEBOUNCE_MS,
            history_cap: DEFAULT_HISTORY_CAP,
            deploy_function: DEFAULT_DEPLOY_FUNCTION.to_string(),
            timeouts: ServiceTimeouts::default(),
        }
    }

    #[must_use]
    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }
}
