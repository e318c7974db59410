//! Comment thread and message board commands.

use folio_client::HttpTransport;
use folio_client::comments::{CommentThread, DEFAULT_PAGE_SIZE, EditOutcome};
use folio_client::guestbook::MESSAGE_SENT;
use folio_core::CommentId;
use tracing::info;

use super::{CliError, Context, report_refresh};

pub async fn list_comments(ctx: &Context, page: u32) -> Result<(), CliError> {
    let viewer = ctx.api.session().user().await;
    let mut thread = CommentThread::new(ctx.api.clone());
    let comments = thread.load(page, DEFAULT_PAGE_SIZE).await?;

    if comments.is_empty() {
        info!("No comments yet");
    }
    for comment in comments {
        let mine = if comment.can_modify(viewer.as_ref()) {
            " (yours)"
        } else {
            ""
        };
        info!(
            "#{} {} on {}{mine}: {}",
            comment.id,
            comment.author(),
            comment.posted_on(),
            comment.content
        );
        for reply in &comment.replies {
            info!(
                "    {} on {}: {}",
                reply.author(),
                reply.posted_on(),
                reply.content
            );
        }
    }
    Ok(())
}

/// Edit and delete check ownership against the loaded thread, so both load
/// the comment's page before acting.
async fn loaded_thread(ctx: &Context, page: u32) -> Result<CommentThread<HttpTransport>, CliError> {
    let mut thread = CommentThread::new(ctx.api.clone());
    thread.load(page, DEFAULT_PAGE_SIZE).await?;
    Ok(thread)
}

pub async fn post_comment(
    ctx: &Context,
    content: &str,
    parent: Option<CommentId>,
) -> Result<(), CliError> {
    let mut thread = CommentThread::new(ctx.api.clone());
    let posted = thread.post(content, parent).await;
    let text = if parent.is_some() {
        "Reply posted"
    } else {
        "Comment posted"
    };
    report_refresh(&ctx.settle(posted, text)?);
    Ok(())
}

pub async fn edit_comment(
    ctx: &Context,
    id: CommentId,
    content: &str,
    page: u32,
) -> Result<(), CliError> {
    let mut thread = loaded_thread(ctx, page).await?;
    let edited = thread.edit(id, content).await;
    if matches!(edited, Ok(EditOutcome::Unchanged)) {
        info!("Nothing to change");
        return Ok(());
    }
    if let EditOutcome::Updated(refreshed) = ctx.settle(edited, "Comment updated")? {
        report_refresh(&refreshed);
    }
    Ok(())
}

pub async fn delete_comment(ctx: &Context, id: CommentId, page: u32) -> Result<(), CliError> {
    let mut thread = loaded_thread(ctx, page).await?;
    let deleted = thread.delete(id).await;
    report_refresh(&ctx.settle(deleted, "Comment deleted")?);
    Ok(())
}

pub async fn list_messages(ctx: &mut Context) -> Result<(), CliError> {
    let messages = ctx.board.list().await?;
    if messages.is_empty() {
        info!("No messages yet");
    }
    for message in messages {
        info!(
            "{} on {}: {}",
            message.author(),
            message.posted_on(),
            message.text()
        );
    }
    Ok(())
}

pub async fn post_message(
    ctx: &mut Context,
    name: &str,
    email: &str,
    content: &str,
) -> Result<(), CliError> {
    let posted = ctx.board.post(name, email, content).await;
    report_refresh(&ctx.settle(posted, MESSAGE_SENT)?);
    Ok(())
}
