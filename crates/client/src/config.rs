//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FOLIO_API_BASE_URL` - Primary API root (default: `http://localhost:8000/api/v1`)
//! - `FOLIO_MESSAGE_BOARD_URL` - Message-board service root
//!   (default: `http://localhost:8002/api/message`)
//! - `FOLIO_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: none)

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_MESSAGE_BOARD_URL: &str = "http://localhost:8002/api/message";

/// A setting that was present but unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the client talks to, and how patiently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Primary API root; endpoint paths are appended to it.
    pub api_base_url: Url,
    /// Message-board service root.
    pub message_board_url: Url,
    /// `None` means requests may hang indefinitely.
    pub http_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Build a configuration from explicit URLs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if either URL does not parse.
    pub fn new(api_base_url: &str, message_board_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("FOLIO_API_BASE_URL", api_base_url)?,
            message_board_url: parse_base_url("FOLIO_MESSAGE_BOARD_URL", message_board_url)?,
            http_timeout: None,
        })
    }

    /// Read the `FOLIO_*` variables, after merging a `.env` file if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "FOLIO_API_BASE_URL",
            &get_env_or_default("FOLIO_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let message_board_url = parse_base_url(
            "FOLIO_MESSAGE_BOARD_URL",
            &get_env_or_default("FOLIO_MESSAGE_BOARD_URL", DEFAULT_MESSAGE_BOARD_URL),
        )?;
        let http_timeout = get_optional_env("FOLIO_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_timeout("FOLIO_HTTP_TIMEOUT_SECS", &raw))
            .transpose()?;

        Ok(Self {
            api_base_url,
            message_board_url,
            http_timeout,
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Set and non-blank, or `None`.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an absolute http(s) URL, dropping any trailing slash.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim().trim_end_matches('/'))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}

fn parse_timeout(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
