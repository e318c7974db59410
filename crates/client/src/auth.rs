//! Login, registration, email verification, and logout.

use std::time::{Duration, Instant};

use folio_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::endpoints;
use crate::error::{ApiError, ValidationError};
use crate::session::{Session, SessionUser};
use crate::transport::Transport;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum wait between verification-code requests.
pub const VERIFICATION_COOLDOWN: Duration = Duration::from_secs(60);

const INVALID_LOGIN_RESPONSE: &str = "Invalid response from server";

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<SessionUser>,
}

/// Registration form input.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    /// Optional code from a prior `send_verification_code`.
    pub verification_code: Option<String>,
}

impl RegisterForm {
    /// Check the form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields`, `WeakPassword`, or `PasswordMismatch`, in
    /// that order of precedence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let password = self.password.expose_secret();
        let confirm = self.confirm_password.expose_secret();

        if self.username.trim().is_empty()
            || self.email.trim().is_empty()
            || password.is_empty()
            || confirm.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if password != confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }

    fn code(&self) -> Option<&str> {
        self.verification_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// How far registration got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Registered and the supplied code was accepted.
    Verified,
    /// Registered, but the supplied code was rejected. The account exists.
    VerificationFailed(ApiError),
    /// Registered without a code.
    Unverified,
}

impl RegisterOutcome {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Verified => "Registration successful! Email verified.",
            Self::VerificationFailed(_) => {
                "Registration successful, but email verification failed. You can verify later."
            }
            Self::Unverified => "Registration successful! Please verify your email later.",
        }
    }
}

/// Tracks the resend wait after a verification code goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationCooldown {
    sent_at: Instant,
}

impl VerificationCooldown {
    #[must_use]
    pub const fn started_at(sent_at: Instant) -> Self {
        Self { sent_at }
    }

    /// Whole seconds left at `now`, rounded up; zero once elapsed.
    #[must_use]
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.sent_at);
        let left = VERIFICATION_COOLDOWN.saturating_sub(elapsed);
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    #[must_use]
    pub fn is_elapsed(&self, now: Instant) -> bool {
        self.remaining_secs(now) == 0
    }
}

/// Account operations. Login and logout write the Session Store.
#[derive(Debug)]
pub struct Auth<T> {
    api: ApiClient<T>,
    cooldown: Option<VerificationCooldown>,
}

impl<T: Transport> Auth<T> {
    #[must_use]
    pub const fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            cooldown: None,
        }
    }

    #[must_use]
    pub const fn cooldown(&self) -> Option<VerificationCooldown> {
        self.cooldown
    }

    /// Log in and store the session.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` without a request for blank input, the
    /// server's error on rejection, or `ApiError::Decode` if the response
    /// carries no token or user.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionUser, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let data: LoginData = self
            .api
            .fetch(&endpoints::login(email, password))
            .await?
            .ok_or_else(|| ApiError::Decode(INVALID_LOGIN_RESPONSE.to_string()))?;

        let token = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode(INVALID_LOGIN_RESPONSE.to_string()))?;
        let mut user = data
            .user
            .ok_or_else(|| ApiError::Decode(INVALID_LOGIN_RESPONSE.to_string()))?;
        if user.email.is_none() {
            user.email = Some(email.to_string());
        }

        self.api.session().login(Session::new(token, user.clone())).await;
        Ok(user)
    }

    /// Create an account, then verify the email if a code was given.
    ///
    /// Registration does not log in.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` without a request if the form is invalid,
    /// or the server's error if registration itself fails. A failed
    /// verification is reported as `RegisterOutcome::VerificationFailed`.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterOutcome, ApiError> {
        form.validate()?;
        let email = form.email.trim();

        self.api
            .execute(&endpoints::register(form.username.trim(), email, &form.password))
            .await?;
        info!("account registered");

        let Some(code) = form.code() else {
            return Ok(RegisterOutcome::Unverified);
        };

        match self.api.execute(&endpoints::verify_email(email, code)).await {
            Ok(_) => Ok(RegisterOutcome::Verified),
            Err(err) => {
                warn!(error = %err, "email verification failed after registration");
                Ok(RegisterOutcome::VerificationFailed(err))
            }
        }
    }

    /// Ask the server to email a verification code.
    ///
    /// # Errors
    ///
    /// Returns `EmailRequired`, `InvalidEmail`, or `ResendCooldown` without a
    /// request, otherwise the server's error.
    pub async fn send_verification_code(&mut self, email: &str) -> Result<(), ApiError> {
        self.send_verification_code_at(email, Instant::now()).await
    }

    /// [`Self::send_verification_code`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Self::send_verification_code`].
    #[instrument(skip(self, now))]
    pub async fn send_verification_code_at(
        &mut self,
        email: &str,
        now: Instant,
    ) -> Result<(), ApiError> {
        if email.trim().is_empty() {
            return Err(ValidationError::EmailRequired.into());
        }
        let email = Email::parse(email).map_err(ValidationError::InvalidEmail)?;

        if let Some(cooldown) = self.cooldown.filter(|c| !c.is_elapsed(now)) {
            return Err(ValidationError::ResendCooldown {
                seconds: cooldown.remaining_secs(now),
            }
            .into());
        }

        self.api
            .execute(&endpoints::send_verification_code(email.as_str()))
            .await?;
        self.cooldown = Some(VerificationCooldown::started_at(now));
        Ok(())
    }

    pub async fn logout(&self) {
        self.api.session().logout().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::UserId;
    use serde_json::json;

    use super::*;
    use crate::api::Method;
    use crate::session::SessionStore;
    use crate::transport::scripted::ScriptedTransport;

    fn auth() -> (Auth<ScriptedTransport>, ScriptedTransport) {
        let transport = ScriptedTransport::new();
        let api = ApiClient::new(
            transport.clone(),
            "http://h/api/v1",
            SessionStore::in_memory(),
        );
        (Auth::new(api), transport)
    }

    fn form(password: &str, confirm: &str, code: Option<&str>) -> RegisterForm {
        RegisterForm {
            username: "a".to_string(),
            email: "a@b.com".to_string(),
            password: SecretString::from(password.to_string()),
            confirm_password: SecretString::from(confirm.to_string()),
            verification_code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_login_stores_session_and_authorizes_later_calls() {
        let (auth, transport) = auth();
        transport
            .respond_ok(
                Method::Post,
                "/users/login",
                json!({ "token": "T", "user": { "id": 7, "username": "a" } }),
            )
            .respond_ok(Method::Get, "/users/7/cart", json!([]));

        let user = auth
            .login(" a@b.com ", &SecretString::from("secret1".to_string()))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.email.as_deref(), Some("a@b.com"));

        let session = auth.api.session();
        assert_eq!(session.token().await.unwrap().expose_secret(), "T");

        auth.api
            .execute(&endpoints::cart(UserId::new(7)))
            .await
            .unwrap();
        let requests = transport.requests();
        assert_eq!(
            requests[0].body,
            Some(json!({ "email": "a@b.com", "password": "secret1" }))
        );
        assert!(requests[0].bearer.is_none());
        assert_eq!(requests[1].authorization().as_deref(), Some("Bearer T"));
    }

    #[tokio::test]
    async fn test_login_without_token_is_decode_error() {
        let (auth, transport) = auth();
        transport.respond_ok(Method::Post, "/users/login", json!({ "user": { "id": 7 } }));

        let err = auth
            .login("a@b.com", &SecretString::from("secret1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Decode("Invalid response from server".to_string())
        );
        assert!(!auth.api.session().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (auth, transport) = auth();
        let err = auth.login("  ", &SecretString::from("x".to_string())).await.unwrap_err();
        assert_eq!(err.user_message(), "Please fill in all fields");
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_register_form_validation_order() {
        assert_eq!(
            form("", "", None).validate(),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            form("abc", "abc", None).validate(),
            Err(ValidationError::WeakPassword { min: 6 })
        );
        assert_eq!(
            form("secret1", "secret2", None).validate(),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(form("secret1", "secret1", None).validate().is_ok());
    }

    #[tokio::test]
    async fn test_register_with_code_verifies() {
        let (auth, transport) = auth();
        transport
            .respond_ok(Method::Post, "/users/register", json!({ "id": 9 }))
            .respond_ok(Method::Post, "/users/verify-email", json!(null));

        let outcome = auth.register(&form("secret1", "secret1", Some(" 123456 "))).await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Verified);
        assert_eq!(
            transport.requests()[1].body,
            Some(json!({ "email": "a@b.com", "code": "123456" }))
        );
    }

    #[tokio::test]
    async fn test_verification_failure_does_not_fail_registration() {
        let (auth, transport) = auth();
        transport
            .respond_ok(Method::Post, "/users/register", json!(null))
            .respond_error(Method::Post, "/users/verify-email", 1, "code expired");

        let outcome = auth.register(&form("secret1", "secret1", Some("000000"))).await.unwrap();
        assert!(matches!(outcome, RegisterOutcome::VerificationFailed(_)));
    }

    #[tokio::test]
    async fn test_register_without_code_skips_verification() {
        let (auth, transport) = auth();
        transport.respond_ok(Method::Post, "/users/register", json!(null));

        let outcome = auth.register(&form("secret1", "secret1", Some("  "))).await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Unverified);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_send_code_checks_email_and_cooldown() {
        let (mut auth, transport) = auth();
        transport.respond_ok(Method::Post, "/users/send-verification-code", json!(null));
        let t0 = Instant::now();

        let err = auth.send_verification_code_at("", t0).await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter your email first");
        let err = auth.send_verification_code_at("a@b", t0).await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter a valid email address");
        assert_eq!(transport.request_count(), 0);

        auth.send_verification_code_at("a@b.com", t0).await.unwrap();
        let err = auth
            .send_verification_code_at("a@b.com", t0 + Duration::from_millis(500))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation(ValidationError::ResendCooldown { seconds: 60 })
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_cooldown_remaining() {
        let t0 = Instant::now();
        let cooldown = VerificationCooldown::started_at(t0);
        assert_eq!(cooldown.remaining_secs(t0), 60);
        assert_eq!(cooldown.remaining_secs(t0 + Duration::from_secs(59)), 1);
        assert!(cooldown.is_elapsed(t0 + VERIFICATION_COOLDOWN));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (auth, _) = auth();
        auth.api
            .session()
            .login(Session::new("T", SessionUser::new(UserId::new(7), "a")))
            .await;
        auth.logout().await;
        assert!(!auth.api.session().is_authenticated().await);
    }
}
