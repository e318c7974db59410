//! Login, the bearer header, registration, and server-side expiry.

#![allow(clippy::unwrap_used)]

use folio_client::auth::{Auth, RegisterForm, RegisterOutcome};
use folio_client::cart::CartController;
use folio_client::session::{FileSessionPersistence, SessionStore};
use folio_client::transport::scripted::ScriptedTransport;
use folio_client::{ApiClient, ApiError, Method, ValidationError};
use folio_core::UserId;
use folio_integration_tests::{BASE_URL, TOKEN, TestContext};
use secrecy::SecretString;
use serde_json::json;

fn password(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

#[tokio::test]
async fn test_login_then_authenticated_call() {
    let ctx = TestContext::new();
    ctx.script_login(7, "ann");
    ctx.transport.respond_ok(Method::Get, "/users/7/cart", json!([]));

    let user = Auth::new(ctx.api.clone())
        .login("ann@example.com", &password("secret1"))
        .await
        .unwrap();
    assert_eq!(user.id, UserId::new(7));
    assert_eq!(user.email.as_deref(), Some("ann@example.com"));
    assert!(ctx.api.session().is_authenticated().await);

    CartController::new(ctx.api.clone()).refresh().await.unwrap();

    let requests = ctx.transport.requests();
    assert!(requests[0].bearer.is_none());
    assert_eq!(
        requests[1].authorization(),
        Some(format!("Bearer {TOKEN}"))
    );
}

#[tokio::test]
async fn test_unauthorized_clears_session_once() {
    let ctx = TestContext::logged_in(7, "ann").await;
    ctx.transport.respond(
        Method::Get,
        "/users/7/cart",
        401,
        &json!({ "detail": "expired" }),
    );

    let mut cart = CartController::new(ctx.api.clone());
    let err = cart.refresh().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
    assert!(!ctx.api.session().is_authenticated().await);
    assert_eq!(ctx.expirations(), 1);

    // Already logged out: the next call fails locally and the hook stays quiet.
    let err = cart.refresh().await.unwrap_err();
    assert_eq!(err, ApiError::Validation(ValidationError::NotLoggedIn));
    assert_eq!(ctx.expirations(), 1);
    assert_eq!(ctx.transport.request_count(), 1);
}

#[tokio::test]
async fn test_rejected_login_keeps_logged_out() {
    let ctx = TestContext::new();
    ctx.transport.respond_error(
        Method::Post,
        "/users/login",
        401,
        "Invalid email or password",
    );

    let err = Auth::new(ctx.api.clone())
        .login("ann@example.com", &password("wrong00"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Invalid email or password");
    assert!(!ctx.api.session().is_authenticated().await);
}

#[tokio::test]
async fn test_login_refused_with_401_is_not_an_expiry() {
    let ctx = TestContext::new();
    ctx.transport.respond(
        Method::Post,
        "/users/login",
        401,
        &json!({ "detail": "Incorrect email or password" }),
    );

    let err = Auth::new(ctx.api.clone())
        .login("ann@example.com", &password("wrong00"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Incorrect email or password");
    assert_eq!(ctx.expirations(), 0);
}

#[tokio::test]
async fn test_register_with_rejected_code_still_succeeds() {
    let ctx = TestContext::new();
    ctx.transport
        .respond_ok(Method::Post, "/users/register", json!({ "id": 9 }))
        .respond_error(
            Method::Post,
            "/users/verify-email",
            400,
            "Invalid code",
        );

    let form = RegisterForm {
        username: "bo".to_string(),
        email: "bo@example.com".to_string(),
        password: password("secret1"),
        confirm_password: password("secret1"),
        verification_code: Some("123456".to_string()),
    };
    let outcome = Auth::new(ctx.api.clone()).register(&form).await.unwrap();

    assert!(matches!(outcome, RegisterOutcome::VerificationFailed(_)));
    assert!(!ctx.api.session().is_authenticated().await);
    assert_eq!(
        ctx.call_log(),
        ["POST /users/register", "POST /users/verify-email"]
    );
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let transport = ScriptedTransport::new();
    transport.respond_ok(
        Method::Post,
        "/users/login",
        json!({ "token": TOKEN, "user": { "id": 7, "username": "ann" } }),
    );
    let first = ApiClient::new(
        transport.clone(),
        BASE_URL,
        SessionStore::new(FileSessionPersistence::new(&path), None),
    );
    Auth::new(first)
        .login("ann@example.com", &password("secret1"))
        .await
        .unwrap();

    let restored = SessionStore::new(FileSessionPersistence::new(&path), None);
    let user = restored.user().await.unwrap();
    assert_eq!(user.id, UserId::new(7));

    restored.logout().await;
    assert!(!path.exists());
}
