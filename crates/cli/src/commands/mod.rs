//! Command implementations.
//!
//! Each command builds the controllers it needs over one shared
//! [`ApiClient`], runs a single action, and reports through `tracing`.
//! Mutations settle on the [`NoticeBoard`]: the notice a screen would show is
//! the line the command prints.

use std::sync::Arc;

use folio_client::guestbook::Guestbook;
use folio_client::session::{ExpireHook, FileSessionPersistence};
use folio_client::{
    ApiClient, ApiError, ConfigError, HttpTransport, NoticeBoard, Refreshed, SessionStore,
    TransportError, ValidationError,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CliConfig;

pub mod account;
pub mod community;
pub mod shop;
pub mod wallet;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not start HTTP client: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Api(err.into())
    }
}

impl CliError {
    /// The line shown to the user on failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Everything a command needs to talk to the backend.
pub struct Context {
    pub api: ApiClient<HttpTransport>,
    pub board: Guestbook<HttpTransport>,
    pub notices: NoticeBoard,
}

impl Context {
    /// # Errors
    ///
    /// Returns `CliError::Transport` if the HTTP client cannot be built.
    pub fn connect(config: &CliConfig) -> Result<Self, CliError> {
        let on_expire: ExpireHook = Arc::new(|| warn!("Session expired. Please login again."));
        let session = SessionStore::new(
            FileSessionPersistence::new(&config.session_file),
            Some(on_expire),
        );
        let (api, board) = folio_client::connect(&config.client, session)?;

        Ok(Self {
            api,
            board,
            notices: NoticeBoard::new(),
        })
    }
}

impl Context {
    /// Post `result` to the notice board, echo a success notice, and hand
    /// the result on. Failures are reported once, by `main`.
    ///
    /// # Errors
    ///
    /// Returns `result`'s error as `CliError::Api`.
    pub fn settle<T>(
        &self,
        result: Result<T, ApiError>,
        success_text: &str,
    ) -> Result<T, CliError> {
        let value = self.notices.settle(result, success_text)?;
        self.announce();
        Ok(value)
    }

    /// Echo the current notice, if any.
    pub fn announce(&self) {
        if let Some(notice) = self.notices.current() {
            info!("{notice}");
        }
    }
}

/// Mention any view that could not be re-fetched after a successful action.
pub fn report_refresh(refreshed: &Refreshed) {
    for failure in refreshed.failures() {
        warn!(
            "Could not refresh {}: {}",
            failure.target,
            failure.error.user_message()
        );
    }
}
