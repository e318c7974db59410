//! Comment Thread: one page of comments, each with one level of replies.
//!
//! The in-memory thread is replaced wholesale on every load, and every
//! successful mutation reloads it. Ownership checks here only decide what
//! the user is offered; the server enforces the real authorization.

use folio_core::{CommentId, UserId, display_timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::{ApiCall, ApiClient, null_as_default};
use crate::endpoints;
use crate::error::{ApiError, ValidationError};
use crate::refresh::{RefreshTarget, Refreshed};
use crate::session::SessionUser;
use crate::transport::Transport;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

const ANONYMOUS: &str = "Anonymous";

fn author_or_anonymous(username: &str) -> &str {
    if username.trim().is_empty() {
        ANONYMOUS
    } else {
        username
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Reply {
    #[must_use]
    pub fn author(&self) -> &str {
        author_or_anonymous(&self.username)
    }

    #[must_use]
    pub fn posted_on(&self) -> String {
        display_timestamp(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub replies: Vec<Reply>,
}

impl Comment {
    #[must_use]
    pub fn author(&self) -> &str {
        author_or_anonymous(&self.username)
    }

    #[must_use]
    pub fn posted_on(&self) -> String {
        display_timestamp(self.created_at.as_deref())
    }

    /// Whether `viewer` may edit or delete this comment.
    #[must_use]
    pub fn can_modify(&self, viewer: Option<&SessionUser>) -> bool {
        viewer.is_some_and(|user| user.id == self.user_id)
    }
}

/// Result of an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The new content matched the old; nothing was sent.
    Unchanged,
    Updated(Refreshed),
}

/// Plan a new comment, or a reply when `parent` is set.
///
/// # Errors
///
/// Returns `ValidationError::EmptyContent` for blank content.
pub fn plan_post(
    author: UserId,
    content: &str,
    parent: Option<CommentId>,
) -> Result<ApiCall, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(endpoints::post_comment(author, content, parent))
}

/// Plan an edit. `Ok(None)` means the content is unchanged.
///
/// # Errors
///
/// Returns `UnknownComment`, `NotOwner`, or `EmptyContent`.
pub fn plan_edit(
    thread: &[Comment],
    viewer: &SessionUser,
    id: CommentId,
    content: &str,
) -> Result<Option<ApiCall>, ValidationError> {
    let comment = owned(thread, viewer, id)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content == comment.content {
        return Ok(None);
    }
    Ok(Some(endpoints::update_comment(id, content)))
}

/// # Errors
///
/// Returns `UnknownComment` or `NotOwner`.
pub fn plan_delete(
    thread: &[Comment],
    viewer: &SessionUser,
    id: CommentId,
) -> Result<ApiCall, ValidationError> {
    owned(thread, viewer, id)?;
    Ok(endpoints::delete_comment(id))
}

fn owned<'a>(
    thread: &'a [Comment],
    viewer: &SessionUser,
    id: CommentId,
) -> Result<&'a Comment, ValidationError> {
    let comment = thread
        .iter()
        .find(|c| c.id == id)
        .ok_or(ValidationError::UnknownComment(id))?;
    if !comment.can_modify(Some(viewer)) {
        return Err(ValidationError::NotOwner);
    }
    Ok(comment)
}

/// The currently displayed page of comments.
#[derive(Debug)]
pub struct CommentThread<T> {
    api: ApiClient<T>,
    comments: Vec<Comment>,
    page: u32,
    page_size: u32,
}

impl<T: Transport> CommentThread<T> {
    #[must_use]
    pub const fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            comments: Vec::new(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Load one page, replacing the whole thread.
    ///
    /// Comments are public; no session is required.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` from the request; the thread is kept on failure.
    #[instrument(skip(self))]
    pub async fn load(&mut self, page: u32, page_size: u32) -> Result<&[Comment], ApiError> {
        self.comments = self
            .api
            .fetch_list(&endpoints::comments(page, page_size))
            .await?;
        self.page = page;
        self.page_size = page_size;
        debug!(count = self.comments.len(), "comments loaded");
        Ok(&self.comments)
    }

    /// Post a comment (or a reply to `parent`), then reload.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` or `EmptyContent` without a request, otherwise
    /// the server's error.
    #[instrument(skip(self, content))]
    pub async fn post(
        &mut self,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Refreshed, ApiError> {
        let user = self.api.session().require_user().await?;
        let call = plan_post(user.id, content, parent)?;
        self.mutate(&call).await
    }

    /// Change the content of one of the viewer's comments.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` without a request if the comment is not
    /// the viewer's or the content is blank, otherwise the server's error.
    #[instrument(skip(self, content))]
    pub async fn edit(&mut self, id: CommentId, content: &str) -> Result<EditOutcome, ApiError> {
        let user = self.api.session().require_user().await?;
        match plan_edit(&self.comments, &user, id, content)? {
            None => Ok(EditOutcome::Unchanged),
            Some(call) => self.mutate(&call).await.map(EditOutcome::Updated),
        }
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` without a request if the comment is not
    /// the viewer's, otherwise the server's error.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: CommentId) -> Result<Refreshed, ApiError> {
        let user = self.api.session().require_user().await?;
        let call = plan_delete(&self.comments, &user, id)?;
        self.mutate(&call).await
    }

    async fn mutate(&mut self, call: &ApiCall) -> Result<Refreshed, ApiError> {
        self.api.execute(call).await?;
        let reloaded = self.load(self.page, self.page_size).await.map(|_| ());
        Ok(Refreshed::new().with(RefreshTarget::Comments, reloaded))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::Method;
    use crate::session::{Session, SessionStore};
    use crate::transport::scripted::ScriptedTransport;

    const PAGE: &str = "/comments?page=1&page_size=50";

    fn thread_json() -> serde_json::Value {
        json!([
            {
                "id": 1, "user_id": 7, "username": "a", "content": "first",
                "created_at": "2025-03-05T14:07:00Z",
                "replies": [{ "username": null, "content": "welcome" }]
            },
            { "id": 2, "user_id": 8, "username": "b", "content": "second", "replies": null }
        ])
    }

    async fn thread() -> (CommentThread<ScriptedTransport>, ScriptedTransport) {
        let transport = ScriptedTransport::new();
        let session = SessionStore::in_memory();
        session
            .login(Session::new("T", SessionUser::new(UserId::new(7), "a")))
            .await;
        let api = ApiClient::new(transport.clone(), "http://h/api/v1", session);
        transport.respond_ok(Method::Get, PAGE, thread_json());
        let mut thread = CommentThread::new(api);
        thread.load(DEFAULT_PAGE, DEFAULT_PAGE_SIZE).await.unwrap();
        (thread, transport)
    }

    #[tokio::test]
    async fn test_load_parses_thread() {
        let (thread, _) = thread().await;
        let comments = thread.comments();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].replies[0].author(), "Anonymous");
        assert_eq!(comments[0].posted_on(), "Mar 5, 2025, 14:07");
        assert!(comments[1].replies.is_empty());
    }

    #[tokio::test]
    async fn test_post_reply_then_reload() {
        let (mut thread, transport) = thread().await;
        transport
            .respond_ok(Method::Post, "/comments", json!(null))
            .respond_ok(Method::Get, PAGE, json!([]));

        let refreshed = thread.post("  thanks  ", Some(CommentId::new(2))).await.unwrap();
        assert!(refreshed.is_clean());
        assert!(thread.comments().is_empty());

        let sent = &transport.requests()[1];
        assert_eq!(
            sent.body,
            Some(json!({ "user_id": 7, "content": "thanks", "parent_id": 2 }))
        );
    }

    #[tokio::test]
    async fn test_blank_comment_sends_nothing() {
        let (mut thread, transport) = thread().await;
        let err = thread.post("   ", None).await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter a comment");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_edit_unchanged_is_noop() {
        let (mut thread, transport) = thread().await;
        let outcome = thread.edit(CommentId::new(1), " first ").await.unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_edit_own_comment() {
        let (mut thread, transport) = thread().await;
        transport
            .respond_ok(Method::Put, "/comments/1", json!(null))
            .respond_ok(Method::Get, PAGE, thread_json());

        let outcome = thread.edit(CommentId::new(1), "edited").await.unwrap();
        assert!(matches!(outcome, EditOutcome::Updated(r) if r.is_clean()));
        assert_eq!(
            transport.requests()[1].body,
            Some(json!({ "content": "edited" }))
        );
    }

    #[tokio::test]
    async fn test_cannot_touch_others_comments() {
        let (mut thread, transport) = thread().await;

        let err = thread.delete(CommentId::new(2)).await.unwrap_err();
        assert_eq!(err, ApiError::Validation(ValidationError::NotOwner));
        let err = thread.edit(CommentId::new(2), "mine now").await.unwrap_err();
        assert_eq!(err, ApiError::Validation(ValidationError::NotOwner));
        let err = thread.delete(CommentId::new(99)).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation(ValidationError::UnknownComment(CommentId::new(99)))
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_reloads_even_if_reload_fails() {
        let (mut thread, transport) = thread().await;
        transport
            .respond_ok(Method::Delete, "/comments/1", json!(null))
            .fail(Method::Get, PAGE, "timeout");

        let refreshed = thread.delete(CommentId::new(1)).await.unwrap();
        assert!(refreshed.failed(RefreshTarget::Comments));
        // The stale thread is kept until a reload succeeds.
        assert_eq!(thread.comments().len(), 2);
    }

    #[test]
    fn test_can_modify_requires_viewer() {
        let comment: Comment = serde_json::from_value(
            json!({ "id": 1, "user_id": 7, "username": "", "content": "x" }),
        )
        .unwrap();
        assert!(!comment.can_modify(None));
        assert!(comment.can_modify(Some(&SessionUser::new(UserId::new(7), "a"))));
        assert_eq!(comment.author(), "Anonymous");
    }
}
