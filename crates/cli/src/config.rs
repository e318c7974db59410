//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `FOLIO_API_BASE_URL` / `FOLIO_MESSAGE_BOARD_URL` / `FOLIO_HTTP_TIMEOUT_SECS` -
//!   see [`ClientConfig::from_env`]
//! - `FOLIO_SESSION_FILE` - where the session is kept between runs
//!   (default `.folio/session.json`)

use std::path::PathBuf;

use folio_client::{ClientConfig, ConfigError};

pub const DEFAULT_SESSION_FILE: &str = ".folio/session.json";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub session_file: PathBuf,
}

impl CliConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if a client variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Merges `.env` first, so the session file can be set there too.
        let client = ClientConfig::from_env()?;
        let session_file = std::env::var("FOLIO_SESSION_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Ok(Self {
            client,
            session_file,
        })
    }
}
