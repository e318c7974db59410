//! Integration tests for the Folio client.
//!
//! # Running Tests
//!
//! ```bash
//! # Scripted end-to-end flows, no backend needed
//! cargo test -p folio-integration-tests
//!
//! # Smoke test against a running backend
//! FOLIO_API_BASE_URL=http://localhost:8000/api/v1 \
//!     cargo test -p folio-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Catalog, cart, checkout, and cancellation together
//! - `wallet_flow` - Lazy wallet creation, top-up, and transfers
//! - `session_flow` - Login, bearer header, and server-side expiry
//! - `community_flow` - Comments and the message board
//! - `live_backend` - Read-only calls against a real backend (ignored)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use folio_client::session::ExpireHook;
use folio_client::transport::scripted::ScriptedTransport;
use folio_client::{ApiClient, Method, Session, SessionStore, SessionUser};
use folio_core::UserId;
use serde_json::{Value, json};

pub const BASE_URL: &str = "http://backend.test/api/v1";
pub const TOKEN: &str = "test-token";

/// A client over a scripted transport, with an expiry counter.
pub struct TestContext {
    pub transport: ScriptedTransport,
    pub api: ApiClient<ScriptedTransport>,
    expirations: Arc<AtomicUsize>,
}

impl TestContext {
    /// A logged-out client.
    #[must_use]
    pub fn new() -> Self {
        let expirations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&expirations);
        let on_expire: ExpireHook = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let transport = ScriptedTransport::new();
        let session = SessionStore::new(
            folio_client::session::MemoryPersistence::default(),
            Some(on_expire),
        );
        let api = ApiClient::new(transport.clone(), BASE_URL, session);

        Self {
            transport,
            api,
            expirations,
        }
    }

    /// A client already holding a session for `user_id`.
    pub async fn logged_in(user_id: i64, username: &str) -> Self {
        let ctx = Self::new();
        ctx.api
            .session()
            .login(Session::new(
                TOKEN,
                SessionUser::new(UserId::new(user_id), username),
            ))
            .await;
        ctx
    }

    /// How many times the expiry hook has fired.
    #[must_use]
    pub fn expirations(&self) -> usize {
        self.expirations.load(Ordering::SeqCst)
    }

    /// Requests sent so far, as `METHOD path` lines without the base path.
    #[must_use]
    pub fn call_log(&self) -> Vec<String> {
        self.transport
            .calls()
            .into_iter()
            .map(|(method, path)| {
                let path = path.strip_prefix("/api/v1").unwrap_or(&path).to_string();
                format!("{method} {path}")
            })
            .collect()
    }

    /// Queue the login response for `user_id`.
    pub fn script_login(&self, user_id: i64, username: &str) {
        self.transport.respond_ok(
            Method::Post,
            "/users/login",
            json!({ "token": TOKEN, "user": { "id": user_id, "username": username } }),
        );
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use]
pub fn product(id: i64, name: &str, price: f64, stock: i64) -> Value {
    json!({ "id": id, "name": name, "price": price, "stock": stock, "category": "Tea" })
}

#[must_use]
pub fn cart_line(product_id: i64, name: &str, price: f64, quantity: u32) -> Value {
    json!({ "product_id": product_id, "product_name": name, "price": price, "quantity": quantity })
}
