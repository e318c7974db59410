//! In-memory transport for tests.
//!
//! Responses are queued per `(method, path)` and consumed in order. A request
//! with no queued response fails like a dropped connection, so an unexpected
//! call surfaces as `ApiError::Network` instead of silently succeeding.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::ExposeSecret;
use serde_json::{Value, json};

use super::{HttpRequest, HttpResponse, Method, Transport, TransportError};

/// A request as the scripted transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    /// Full URL as sent.
    pub url: String,
    /// Path plus query, e.g. `/api/v1/users/7/cart`.
    pub path: String,
    /// Exposed bearer token, for header assertions.
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// The `Authorization` header value the request carried.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|token| format!("Bearer {token}"))
    }

    /// Whether this request matches `method` and ends with `path`.
    #[must_use]
    pub fn is(&self, method: Method, path: &str) -> bool {
        self.method == method && self.path.ends_with(path)
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

#[derive(Debug, Default)]
struct Script {
    routes: Vec<Route>,
    log: Vec<RecordedRequest>,
}

/// Scripted transport. Clones share one script and one request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(route) = script
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            route.replies.push_back(reply);
        } else {
            script.routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            });
        }
        self
    }

    /// Queue a raw response.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: &Value) -> &Self {
        self.push(
            method,
            path,
            Reply::Respond(HttpResponse::new(status, body.to_string())),
        )
    }

    /// Queue a raw, possibly non-JSON, response body.
    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.push(
            method,
            path,
            Reply::Respond(HttpResponse::new(status, body)),
        )
    }

    /// Queue a success envelope `{code: 0, msg: "success", data}`.
    pub fn respond_ok(&self, method: Method, path: &str, data: Value) -> &Self {
        self.respond(
            method,
            path,
            200,
            &json!({ "code": 0, "msg": "success", "data": data }),
        )
    }

    /// Queue a failure envelope with HTTP 200 and a non-zero code.
    pub fn respond_error(&self, method: Method, path: &str, code: i64, msg: &str) -> &Self {
        self.respond(
            method,
            path,
            200,
            &json!({ "code": code, "msg": msg, "data": null }),
        )
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Reply::Fail(message.to_string()))
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .log
            .clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .log
            .len()
    }

    /// `(method, path)` pairs of every request, for compact assertions.
    #[must_use]
    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect()
    }

    /// Number of queued replies not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .routes
            .iter()
            .map(|r| r.replies.len())
            .sum()
    }
}

fn path_and_query(url: &str) -> String {
    url::Url::parse(url).map_or_else(
        |_| url.to_string(),
        |parsed| match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        },
    )
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = path_and_query(&request.url);
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);

        script.log.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            path: path.clone(),
            bearer: request
                .bearer
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
            body: request.json.clone(),
        });

        // Longest matching suffix wins, so `/cart` never shadows `/cart/3`.
        let reply = script
            .routes
            .iter_mut()
            .filter(|route| route.method == request.method && path.ends_with(&route.path))
            .max_by_key(|route| route.path.len())
            .and_then(|route| route.replies.pop_front());

        drop(script);

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError::Io(message)),
            None => Err(TransportError::Io(format!(
                "no scripted response for {} {path}",
                request.method
            ))),
        }
    }
}
