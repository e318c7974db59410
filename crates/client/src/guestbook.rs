//! Message-board client.
//!
//! The message board is a separate service with its own base URL. It takes
//! no bearer credential and uses no `{code, msg, data}` envelope: success is
//! a 2xx status, and listings are a bare JSON array.

use folio_core::display_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::error::{ApiError, ValidationError};
use crate::refresh::{RefreshTarget, Refreshed};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

pub const SEND_FAILED: &str = "Failed to send message. Please try again.";
pub const LOAD_FAILED: &str = "Failed to load messages. Please refresh the page.";
pub const MESSAGE_SENT: &str = "Message sent successfully!";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Older entries carry the text here instead of `content`.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub create_at: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl Message {
    #[must_use]
    pub fn author(&self) -> &str {
        non_blank(self.name.as_ref()).unwrap_or("Anonymous")
    }

    #[must_use]
    pub fn text(&self) -> &str {
        non_blank(self.content.as_ref())
            .or_else(|| non_blank(self.message.as_ref()))
            .unwrap_or("No content")
    }

    #[must_use]
    pub fn posted_on(&self) -> String {
        let stamp = non_blank(self.create_at.as_ref()).or_else(|| non_blank(self.date.as_ref()));
        display_timestamp(stamp)
    }
}

/// Decode a listing: a bare array, or an array under `data`. Anything else
/// is an empty board. Null and malformed entries are skipped.
fn decode_listing(body: &str) -> Result<Vec<Message>, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut wrapper) => match wrapper.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| {
            serde_json::from_value(item)
                .inspect_err(|e| debug!(error = %e, "skipping malformed message"))
                .ok()
        })
        .collect())
}

/// Client for the message-board service.
#[derive(Debug)]
pub struct Guestbook<T> {
    transport: T,
    base_url: String,
    messages: Vec<Message>,
}

impl<T: Transport> Guestbook<T> {
    #[must_use]
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        json: Option<Value>,
    ) -> Result<HttpResponse, ApiError> {
        let request = HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            bearer: None,
            json,
        };
        self.transport
            .send(request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Fetch all messages, replacing the list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the service is unreachable, or
    /// `ApiError::Application` for a non-2xx status.
    #[instrument(skip(self))]
    pub async fn list(&mut self) -> Result<&[Message], ApiError> {
        let response = self.send(Method::Get, "/getmessage", None).await?;
        if !response.is_success() {
            warn!(status = response.status, "message board listing failed");
            return Err(ApiError::application(
                i64::from(response.status),
                Some(LOAD_FAILED.to_string()),
            ));
        }
        self.messages = decode_listing(&response.body)?;
        Ok(&self.messages)
    }

    /// Leave a message, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyContent` without a request for a blank
    /// message, `ApiError::Network` if unreachable, or `ApiError::Application`
    /// with [`SEND_FAILED`] for a non-2xx status.
    #[instrument(skip(self, email, content))]
    pub async fn post(
        &mut self,
        name: &str,
        email: &str,
        content: &str,
    ) -> Result<Refreshed, ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }

        let body = json!({ "name": name.trim(), "email": email.trim(), "content": content });
        let response = self.send(Method::Post, "/postmessage", Some(body)).await?;
        if !response.is_success() {
            warn!(status = response.status, "message board post failed");
            return Err(ApiError::application(
                i64::from(response.status),
                Some(SEND_FAILED.to_string()),
            ));
        }

        let reloaded = self.list().await.map(|_| ());
        Ok(Refreshed::new().with(RefreshTarget::Messages, reloaded))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::scripted::ScriptedTransport;

    fn board() -> (Guestbook<ScriptedTransport>, ScriptedTransport) {
        let transport = ScriptedTransport::new();
        (
            Guestbook::new(transport.clone(), "http://localhost:8002/api/message/"),
            transport,
        )
    }

    #[test]
    fn test_message_fallbacks() {
        let legacy: Message =
            serde_json::from_value(json!({ "message": "hi", "date": "2025-01-02T03:04:00Z" }))
                .unwrap();
        assert_eq!(legacy.author(), "Anonymous");
        assert_eq!(legacy.text(), "hi");
        assert_eq!(legacy.posted_on(), "Jan 2, 2025, 03:04");

        let current: Message =
            serde_json::from_value(json!({ "name": "Ann", "content": "new", "message": "old" }))
                .unwrap();
        assert_eq!(current.author(), "Ann");
        assert_eq!(current.text(), "new");

        assert_eq!(Message::default().text(), "No content");
    }

    #[test]
    fn test_decode_listing_shapes() {
        assert_eq!(
            decode_listing("[null, {\"name\": \"a\"}]").unwrap().len(),
            1
        );
        assert_eq!(decode_listing("{\"data\": [{}]}").unwrap().len(), 1);
        assert!(decode_listing("null").unwrap().is_empty());
        assert!(decode_listing("{\"code\": 0}").unwrap().is_empty());
        assert!(decode_listing("<html>").is_err());
    }

    #[tokio::test]
    async fn test_list_sends_no_credential() {
        let (mut board, transport) = board();
        transport.respond(
            Method::Get,
            "/getmessage",
            200,
            &json!([{ "name": "a", "content": "x" }]),
        );

        assert_eq!(board.list().await.unwrap().len(), 1);
        let request = &transport.requests()[0];
        assert_eq!(request.url, "http://localhost:8002/api/message/getmessage");
        assert!(request.bearer.is_none());
    }

    #[tokio::test]
    async fn test_post_then_reload() {
        let (mut board, transport) = board();
        transport
            .respond(Method::Post, "/postmessage", 201, &json!({ "ok": true }))
            .respond(
                Method::Get,
                "/getmessage",
                200,
                &json!([{ "name": "Ann", "content": "hello" }]),
            );

        let refreshed = board.post("Ann", "ann@example.com", " hello ").await.unwrap();
        assert!(refreshed.is_clean());
        assert_eq!(board.messages()[0].text(), "hello");
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({ "name": "Ann", "email": "ann@example.com", "content": "hello" }))
        );
    }

    #[tokio::test]
    async fn test_post_failure_message() {
        let (mut board, transport) = board();
        transport.respond_text(Method::Post, "/postmessage", 500, "oops");

        let err = board.post("Ann", "", "hello").await.unwrap_err();
        assert_eq!(err.user_message(), SEND_FAILED);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_message_sends_nothing() {
        let (mut board, transport) = board();
        assert!(board.post("Ann", "", "  ").await.unwrap_err().is_validation());
        assert_eq!(transport.request_count(), 0);
    }
}
