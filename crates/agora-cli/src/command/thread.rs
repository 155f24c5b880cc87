use std::sync::Arc;

use agora_core::session::SessionProvider;
use agora_core::store::PgCommentStore;
use agora_core::thread::{CommentThread, NodeState};
use agora_postgres::PgClient;
use anyhow::Context;
use futures::future;
use uuid::Uuid;

use crate::TRACING_TARGET_COMMAND;

type Thread = CommentThread<PgCommentStore>;

async fn open(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    post_id: Uuid,
) -> anyhow::Result<Thread> {
    let mut thread = CommentThread::new(post_id, Arc::new(PgCommentStore::new(client)), session);
    thread.refresh().await.context("failed to load comments")?;
    Ok(thread)
}

/// Expands every comment that offers its replies, one level at a time.
///
/// Siblings load concurrently. Comments whose replies fail to load stay
/// collapsed with their error and are not retried.
async fn expand_all(thread: &mut Thread) -> anyhow::Result<()> {
    loop {
        let pending: Vec<Uuid> = thread
            .lines(None)
            .into_iter()
            .filter(|line| line.affordances.show_replies)
            .filter(|line| !matches!(line.state, NodeState::CollapsedWithError(_)))
            .map(|line| line.comment.id)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let loads = pending
            .iter()
            .map(|&comment_id| thread.request_expand(comment_id))
            .collect::<Result<Vec<_>, _>>()?;

        let results = future::join_all(loads).await;
        for (comment_id, result) in pending.into_iter().zip(results) {
            thread.apply_replies(comment_id, result);
        }
    }
}

pub async fn print(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    post_id: Uuid,
    expand: bool,
) -> anyhow::Result<()> {
    let viewer = session.current_user_id();
    let mut thread = open(client, session, post_id).await?;
    if expand {
        expand_all(&mut thread).await?;
    }

    for line in thread.lines(viewer) {
        let indent = "  ".repeat(line.depth);
        let comment = line.comment;
        let mut marks = Vec::new();
        if line.affordances.show_replies {
            marks.push(format!("+{} replies", comment.reply_count));
        }
        if line.affordances.delete {
            marks.push("yours".to_owned());
        }
        if let Some(error) = line.state.error() {
            marks.push(format!("replies failed: {error}"));
        }

        println!("{indent}{}  {}", comment.id, comment.body);
        if !marks.is_empty() {
            println!("{indent}  ({})", marks.join(", "));
        }
    }

    Ok(())
}

pub async fn comment(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    post_id: Uuid,
    body: String,
    reply_to: Option<Uuid>,
) -> anyhow::Result<()> {
    let mut thread = open(client, session, post_id).await?;
    if let Some(target_id) = reply_to {
        expand_all(&mut thread).await?;
        thread
            .begin_reply(target_id)
            .context("reply target is not part of this thread")?;
    }

    thread.composer_mut().set_body(body);
    let created = thread.submit().await.context("failed to submit comment")?;

    tracing::info!(target: TRACING_TARGET_COMMAND, comment_id = %created.id, "Comment submitted");
    println!("{}", created.id);
    Ok(())
}

pub async fn delete(
    client: PgClient,
    session: Arc<dyn SessionProvider>,
    post_id: Uuid,
    comment_id: Uuid,
) -> anyhow::Result<()> {
    let mut thread = open(client, session, post_id).await?;
    expand_all(&mut thread).await?;
    thread
        .delete(comment_id)
        .await
        .context("failed to delete comment")?;

    println!("deleted {comment_id}");
    Ok(())
}
