//! Primary-API request wrapper.
//!
//! Every call to the backend goes through [`ApiClient::execute`]:
//!
//! 1. The bearer credential from the [`SessionStore`] is attached, if any.
//! 2. HTTP 401 clears the session (firing its expiry hook) and fails with
//!    [`ApiError::Unauthorized`]. Callers must not retry. With no session to
//!    clear (a refused login) it is an [`ApiError::Application`] with code 401
//!    carrying the server's message.
//! 3. The body is parsed as a `{code, msg, data}` envelope; a non-zero `code`
//!    is an [`ApiError::Application`] carrying `msg`.
//! 4. Transport failures are [`ApiError::Network`].
//!
//! Nothing is retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::session::SessionStore;
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub use crate::transport::Method;

/// Envelope code the backend uses for "not found".
const NOT_FOUND_CODE: i64 = 404;

/// One planned call against the primary API.
///
/// Planning functions return these instead of performing I/O, so callers and
/// tests can inspect exactly what would be sent.
#[derive(Clone, PartialEq)]
pub struct ApiCall {
    pub method: Method,
    /// Path relative to the API base, including any query string.
    pub endpoint: String,
    pub body: Option<Value>,
}

impl ApiCall {
    #[must_use]
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    #[must_use]
    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, endpoint).with_body(body)
    }

    #[must_use]
    pub fn put(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, endpoint).with_body(body)
    }

    #[must_use]
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

// Bodies may carry passwords; keep them out of logs.
impl std::fmt::Debug for ApiCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCall")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl std::fmt::Display for ApiCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

/// The `{code, msg, data}` wrapper every primary-API response uses.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Client for the primary API.
///
/// Cloning is cheap; clones share the transport and session.
pub struct ApiClient<T> {
    inner: Arc<ApiClientInner<T>>,
}

struct ApiClientInner<T> {
    transport: T,
    base_url: String,
    session: SessionStore,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ApiClient<T> {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:8000/api/v1`).
    #[must_use]
    pub fn new(transport: T, base_url: &str, session: SessionStore) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                transport,
                base_url: base_url.trim_end_matches('/').to_string(),
                session,
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute endpoints pass through untouched.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{endpoint}", self.inner.base_url)
        }
    }

    /// Issue one call and return the envelope's `data`, if any.
    ///
    /// # Errors
    ///
    /// See the module docs for the error mapping.
    #[instrument(skip(self, call), fields(method = %call.method, endpoint = %call.endpoint))]
    pub async fn execute(&self, call: &ApiCall) -> Result<Option<Value>, ApiError> {
        let request = HttpRequest {
            method: call.method,
            url: self.url(&call.endpoint),
            bearer: self.inner.session.token().await,
            json: call.body.clone(),
        };

        let response = self.inner.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "request failed without a response");
            ApiError::Network(e.to_string())
        })?;

        if response.status == 401 {
            if self.inner.session.expire().await {
                warn!("credential rejected, session cleared");
                return Err(ApiError::Unauthorized);
            }
            // Nothing to expire: a refused login, not a lapsed session.
            debug!("401 without a session");
            return Err(ApiError::application(
                401,
                Some(rejection_message(&response.body)),
            ));
        }

        interpret(&response)
    }

    /// Issue a call and deserialize `data` into `R`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if `data` does not match `R`.
    pub async fn fetch<R: DeserializeOwned>(&self, call: &ApiCall) -> Result<Option<R>, ApiError> {
        match self.execute(call).await? {
            None | Some(Value::Null) => Ok(None),
            Some(data) => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| ApiError::Decode(e.to_string())),
        }
    }

    /// Issue a call whose `data` is a list. Missing or non-array data is empty.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if an element does not match `R`.
    pub async fn fetch_list<R: DeserializeOwned>(
        &self,
        call: &ApiCall,
    ) -> Result<Vec<R>, ApiError> {
        match self.execute(call).await? {
            Some(data @ Value::Array(_)) => {
                serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// `msg` or `detail` from a 401 body, else `"Unauthorized"`.
fn rejection_message(body: &str) -> String {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    ["msg", "detail"]
        .into_iter()
        .find_map(|key| parsed.get(key).and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or("Unauthorized")
        .to_string()
}

/// Map a non-401 response to the envelope's data or an error.
fn interpret(response: &HttpResponse) -> Result<Option<Value>, ApiError> {
    let status = i64::from(response.status);

    let envelope: Envelope = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(status, error = %e, "response body is not an envelope");
            return Err(match response.status {
                404 => ApiError::NotFound {
                    message: "Resource not found".to_string(),
                },
                _ if !response.is_success() => ApiError::application(status, None),
                _ => ApiError::Decode(e.to_string()),
            });
        }
    };

    let code = envelope.code.unwrap_or(0);
    if code == NOT_FOUND_CODE || (code == 0 && response.status == 404) {
        return Err(ApiError::NotFound {
            message: envelope
                .msg
                .unwrap_or_else(|| "Resource not found".to_string()),
        });
    }

    if code != 0 {
        debug!(code, msg = ?envelope.msg, "application error");
        return Err(ApiError::application(code, envelope.msg));
    }

    if !response.is_success() {
        return Err(ApiError::application(status, envelope.msg));
    }

    Ok(envelope.data)
}

/// Deserialize `null` as the type's default.
///
/// The backend sends explicit nulls for empty collections and zero balances.
pub(crate) fn null_as_default<'de, D, V>(deserializer: D) -> Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: Default + Deserialize<'de>,
{
    Option::<V>::deserialize(deserializer).map(Option::unwrap_or_default)
}
