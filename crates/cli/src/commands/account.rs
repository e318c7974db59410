//! Account commands: login, logout, registration, verification.

use folio_client::auth::{Auth, RegisterForm, RegisterOutcome};
use secrecy::SecretString;
use tracing::{info, warn};

use super::{CliError, Context};

pub async fn login(ctx: &Context, email: &str, password: String) -> Result<(), CliError> {
    let user = Auth::new(ctx.api.clone())
        .login(email, &SecretString::from(password))
        .await?;
    info!("Logged in as {} (id {})", user.display_name(), user.id);
    Ok(())
}

pub async fn logout(ctx: &Context) {
    Auth::new(ctx.api.clone()).logout().await;
    info!("Logged out");
}

pub async fn register(
    ctx: &Context,
    username: String,
    email: String,
    password: String,
    confirm: String,
    code: Option<String>,
) -> Result<(), CliError> {
    let form = RegisterForm {
        username,
        email,
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm),
        verification_code: code,
    };

    let outcome = Auth::new(ctx.api.clone()).register(&form).await?;
    match &outcome {
        RegisterOutcome::VerificationFailed(err) => {
            warn!("{} ({})", outcome.message(), err.user_message());
        }
        RegisterOutcome::Verified | RegisterOutcome::Unverified => info!("{}", outcome.message()),
    }
    Ok(())
}

/// Each run is a fresh process, so the resend wait only applies within one
/// invocation; the server enforces its own limit.
pub async fn send_code(ctx: &Context, email: &str) -> Result<(), CliError> {
    Auth::new(ctx.api.clone()).send_verification_code(email).await?;
    info!("Verification code sent to {}", email.trim());
    Ok(())
}

pub async fn whoami(ctx: &Context) {
    match ctx.api.session().user().await {
        Some(user) => match &user.email {
            Some(email) => info!("{} (id {}) <{email}>", user.display_name(), user.id),
            None => info!("{} (id {})", user.display_name(), user.id),
        },
        None => info!("Not logged in"),
    }
}
