//! Backend connection configuration read from the environment.
//!
//! Both variables are required before anything touches the realtime backend.
//! A missing (or empty) variable is a fatal startup condition.

use thiserror::Error;

/// Base URL of the backend (e.g. `http://127.0.0.1:8080`)
pub const BACKEND_URL_VAR: &str = "TURUP_BACKEND_URL";

/// API key presented to the realtime hub
pub const BACKEND_KEY_VAR: &str = "TURUP_BACKEND_KEY";

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    /// The backend URL is not an http(s) URL
    #[error("Invalid backend URL '{0}': expected http:// or https://")]
    InvalidUrl(String),
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// HTTP base URL, without a trailing slash
    pub url: String,
    /// API key passed to the realtime hub
    pub api_key: String,
}

impl BackendConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if either variable is absent or empty,
    /// and [`ConfigError::InvalidUrl`] if the URL scheme is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = required(&lookup, BACKEND_URL_VAR)?;
        let api_key = required(&lookup, BACKEND_KEY_VAR)?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url));
        }

        let url = url.trim_end_matches('/').to_string();
        tracing::debug!("Backend configured at {}", url);
        Ok(Self { url, api_key })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}
