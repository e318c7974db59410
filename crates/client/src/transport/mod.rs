//! HTTP transport seam.
//!
//! [`ApiClient`](crate::ApiClient) and [`Guestbook`](crate::guestbook::Guestbook)
//! never touch `reqwest` directly; they hand a fully-formed [`HttpRequest`] to a
//! [`Transport`] and interpret the raw [`HttpResponse`]. Production code uses
//! [`HttpTransport`]. Tests use [`scripted::ScriptedTransport`], which records
//! every request so "no network call was made" is a plain assertion.

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

mod http;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;

pub use http::HttpTransport;

/// HTTP methods used by the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready to go on the wire.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<SecretString>,
    /// JSON body, sent with `Content-Type: application/json`.
    pub json: Option<serde_json::Value>,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .field("has_body", &self.json.is_some())
            .finish()
    }
}

/// Raw response: status plus the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),

    /// Connection, DNS, TLS, or body-read failure.
    #[error("{0}")]
    Io(String),
}

/// Sends requests and returns raw responses.
///
/// Implementations must not interpret status codes; that is the caller's job.
pub trait Transport: Send + Sync {
    /// Send one request. No retries.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
