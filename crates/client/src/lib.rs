//! Folio Client - Typed client for the site backend.
//!
//! The backend is the single source of truth for products, carts, orders,
//! balances, and comments. Everything here is choreography around it:
//! validate input locally, issue one REST call, then re-fetch whatever the
//! call may have changed.
//!
//! # Architecture
//!
//! - [`session`] holds the bearer credential and is the only shared state
//! - [`api`] wraps every primary-API call: auth header, `{code, msg, data}`
//!   envelope, 401 expiry handling
//! - [`transport`] is the I/O seam; production uses `reqwest`, tests use a
//!   scripted transport
//! - Feature controllers ([`cart`], [`checkout`], [`orders`], [`wallet`],
//!   [`comments`], [`catalog`], [`guestbook`], [`auth`]) each own a private
//!   in-memory mirror and never patch it locally after a mutation
//!
//! Validation and planning are pure functions returning the [`api::ApiCall`]s
//! to issue, so the "no request was made" cases are testable without I/O.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod comments;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod guestbook;
pub mod notice;
pub mod orders;
pub mod refresh;
pub mod session;
pub mod transport;
pub mod wallet;

pub use api::{ApiCall, ApiClient, Method};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ValidationError};
pub use notice::{Control, Notice, NoticeBoard};
pub use refresh::{RefreshTarget, Refreshed};
pub use session::{Session, SessionStore, SessionUser};
pub use transport::{HttpTransport, Transport, TransportError};

/// Build a primary-API client and a guestbook client over one HTTP transport.
///
/// # Errors
///
/// Returns `TransportError` if the HTTP client cannot be built.
pub fn connect(
    config: &ClientConfig,
    session: SessionStore,
) -> Result<(ApiClient<HttpTransport>, guestbook::Guestbook<HttpTransport>), TransportError> {
    let transport = HttpTransport::new(config.http_timeout)?;
    let api = ApiClient::new(transport.clone(), config.api_base_url.as_str(), session);
    let board = guestbook::Guestbook::new(transport, config.message_board_url.as_str());
    Ok((api, board))
}
