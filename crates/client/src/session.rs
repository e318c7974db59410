//! Session Store: the bearer credential and who it belongs to.
//!
//! A [`SessionStore`] is created once and handed to every component that
//! needs it. It is the only mutable state shared across components. The
//! lifecycle is explicit:
//!
//! - [`SessionStore::login`] after a successful `POST /users/login`
//! - [`SessionStore::logout`] when the user asks
//! - [`SessionStore::expire`] when the API answers 401, which also fires the
//!   `on_expire` hook registered at construction
//!
//! Persistence is a collaborator behind [`SessionPersistence`]. Its failures
//! are logged and never affect the in-memory state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use folio_core::UserId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ValidationError;

/// The authenticated user as the login response describes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionUser {
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name to greet the user with; falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            self.email.as_deref().unwrap_or("")
        } else {
            &self.username
        }
    }
}

/// Credential plus identity.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    user: SessionUser,
}

impl Session {
    #[must_use]
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// On-disk shape of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    user: SessionUser,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.expose_secret().to_string(),
            user: session.user.clone(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self::new(stored.token, stored.user)
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Where a session survives between runs.
pub trait SessionPersistence: Send + Sync {
    /// Load the saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the backing store cannot be read.
    fn load(&self) -> Result<Option<Session>, PersistenceError>;

    /// Save `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the backing store cannot be written.
    fn save(&self, session: &Session) -> Result<(), PersistenceError>;

    /// Forget the saved session.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the backing store cannot be written.
    fn clear(&self) -> Result<(), PersistenceError>;
}

/// Keeps the session for the life of the process only.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    slot: Mutex<Option<StoredSession>>,
}

impl SessionPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Session>, PersistenceError> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.clone().map(Session::from))
    }

    fn save(&self, session: &Session) -> Result<(), PersistenceError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.into());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file persistence, used by the CLI.
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> Result<Option<Session>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(Some(stored.into()))
    }

    fn save(&self, session: &Session) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&StoredSession::from(session))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Called once when the server signals expiry. Stands in for "redirect to login".
pub type ExpireHook = Arc<dyn Fn() + Send + Sync>;

/// Shared handle to the current session. Clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    current: RwLock<Option<Session>>,
    persistence: Box<dyn SessionPersistence>,
    on_expire: Option<ExpireHook>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_on_expire", &self.inner.on_expire.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store, restoring any session `persistence` holds.
    #[must_use]
    pub fn new(
        persistence: impl SessionPersistence + 'static,
        on_expire: Option<ExpireHook>,
    ) -> Self {
        let restored = match persistence.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "could not restore session, starting logged out");
                None
            }
        };
        if let Some(session) = &restored {
            debug!(user_id = %session.user.id, "session restored");
        }

        Self {
            inner: Arc::new(SessionStoreInner {
                current: RwLock::new(restored),
                persistence: Box::new(persistence),
                on_expire,
            }),
        }
    }

    /// A logged-out store with no persistence and no expiry hook.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryPersistence::default(), None)
    }

    pub async fn login(&self, session: Session) {
        if let Err(e) = self.inner.persistence.save(&session) {
            warn!(error = %e, "could not persist session");
        }
        info!(user_id = %session.user.id, "logged in");
        *self.inner.current.write().await = Some(session);
    }

    pub async fn logout(&self) {
        let previous = self.inner.current.write().await.take();
        self.forget();
        if let Some(session) = previous {
            info!(user_id = %session.user.id, "logged out");
        }
    }

    /// Clear the session because the server rejected the credential.
    ///
    /// Returns whether a session was present. The expiry hook fires only then,
    /// so concurrent 401s trigger it once.
    pub async fn expire(&self) -> bool {
        let previous = self.inner.current.write().await.take();
        let Some(session) = previous else {
            return false;
        };

        self.forget();
        warn!(user_id = %session.user.id, "session expired");
        if let Some(hook) = &self.inner.on_expire {
            hook();
        }
        true
    }

    fn forget(&self) {
        if let Err(e) = self.inner.persistence.clear() {
            warn!(error = %e, "could not clear persisted session");
        }
    }

    pub async fn current(&self) -> Option<Session> {
        self.inner.current.read().await.clone()
    }

    pub async fn token(&self) -> Option<SecretString> {
        self.inner
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.inner
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.current.read().await.is_some()
    }

    /// The logged-in user, or `ValidationError::NotLoggedIn`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotLoggedIn` if no session is present.
    pub async fn require_user(&self) -> Result<SessionUser, ValidationError> {
        self.user().await.ok_or(ValidationError::NotLoggedIn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn session() -> Session {
        Session::new(
            "T",
            SessionUser::new(UserId::new(7), "a").with_email("a@b.com"),
        )
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let store = SessionStore::in_memory();
        assert!(!store.is_authenticated().await);

        store.login(session()).await;
        assert_eq!(store.token().await.unwrap().expose_secret(), "T");
        assert_eq!(store.require_user().await.unwrap().id, UserId::new(7));

        store.logout().await;
        assert!(store.current().await.is_none());
        assert_eq!(
            store.require_user().await.unwrap_err(),
            ValidationError::NotLoggedIn
        );
    }

    #[tokio::test]
    async fn test_expire_fires_hook_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let hook: ExpireHook = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let store = SessionStore::new(MemoryPersistence::default(), Some(hook));

        store.login(session()).await;
        assert!(store.expire().await);
        assert!(!store.expire().await);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_file_persistence_restores_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::new(FileSessionPersistence::new(&path), None);
        store.login(session()).await;
        assert!(path.exists());

        let restored = SessionStore::new(FileSessionPersistence::new(&path), None);
        let user = restored.user().await.unwrap();
        assert_eq!(user.username, "a");
        assert_eq!(user.email.as_deref(), Some("a@b.com"));

        restored.logout().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(FileSessionPersistence::new(&path), None);
        assert!(!store.is_authenticated().await);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let debug = format!("{:?}", session());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("\"T\""));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = SessionUser::new(UserId::new(1), "").with_email("x@y.io");
        assert_eq!(user.display_name(), "x@y.io");
    }
}
