use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use jiff::Timestamp;
use uuid::Uuid;

use super::CommentStore;
use crate::comment::{Comment, NewComment};
use crate::{Error, Result, TRACING_TARGET_STORE};

/// Operations of a [`CommentStore`], used for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StoreOperation {
    FetchTopLevel,
    FetchReplies,
    Insert,
    Delete,
}

#[derive(Debug, Default)]
struct MemoryState {
    comments: Vec<Comment>,
    failing: HashSet<StoreOperation>,
    calls: HashMap<StoreOperation, usize>,
    latency: Option<Duration>,
    reply_latency: HashMap<Uuid, Duration>,
}

impl MemoryState {
    fn list(&self, matches: impl Fn(&Comment) -> bool) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|comment| matches(comment))
            .map(|comment| Comment {
                reply_count: self.reply_count(comment.id),
                ..comment.clone()
            })
            .collect()
    }

    fn reply_count(&self, comment_id: Uuid) -> u64 {
        self.comments
            .iter()
            .filter(|comment| comment.parent_id == Some(comment_id))
            .count() as u64
    }

    fn subtree(&self, root_id: Uuid) -> HashSet<Uuid> {
        let mut ids = HashSet::from([root_id]);
        let mut frontier = vec![root_id];

        while let Some(parent_id) = frontier.pop() {
            for comment in &self.comments {
                if comment.parent_id == Some(parent_id) && ids.insert(comment.id) {
                    frontier.push(comment.id);
                }
            }
        }

        ids
    }
}

/// In-process [`CommentStore`].
///
/// Clones share the same comments. Calls can be made to fail or to take a
/// given amount of (tokio) time, and every call is counted.
#[derive(Debug, Clone, Default)]
pub struct MemoryCommentStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryCommentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later call of `operation` fail, or succeed again.
    pub fn set_failing(&self, operation: StoreOperation, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = Some(latency);
    }

    /// Delays reply fetches of `parent_id` by `latency`, overriding [`Self::set_latency`].
    pub fn set_reply_latency(&self, parent_id: Uuid, latency: Duration) {
        self.lock().reply_latency.insert(parent_id, latency);
    }

    /// Returns how many times `operation` was called.
    pub fn calls(&self, operation: StoreOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or_default()
    }

    /// Returns every stored comment in insertion order.
    pub fn comments(&self) -> Vec<Comment> {
        let state = self.lock();
        state.list(|_| true)
    }

    /// Counts the call, then fails it or returns the delay to apply.
    fn begin(&self, operation: StoreOperation, parent_id: Option<Uuid>) -> Result<Option<Duration>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_default() += 1;

        if state.failing.contains(&operation) {
            tracing::debug!(target: TRACING_TARGET_STORE, %operation, "Injected store failure");
            return Err(Error::data_access().with_message(format!("{operation} failed")));
        }

        let latency = parent_id
            .and_then(|id| state.reply_latency.get(&id).copied())
            .or(state.latency);
        Ok(latency)
    }

    async fn wait(latency: Option<Duration>) {
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl CommentStore for MemoryCommentStore {
    async fn fetch_top_level(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let latency = self.begin(StoreOperation::FetchTopLevel, None)?;
        Self::wait(latency).await;

        let state = self.lock();
        Ok(state.list(|comment| comment.post_id == post_id && comment.parent_id.is_none()))
    }

    async fn fetch_replies(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let latency = self.begin(StoreOperation::FetchReplies, Some(parent_id))?;
        Self::wait(latency).await;

        let state = self.lock();
        Ok(state.list(|comment| comment.parent_id == Some(parent_id)))
    }

    async fn insert(&self, new_comment: NewComment) -> Result<Comment> {
        let latency = self.begin(StoreOperation::Insert, None)?;
        Self::wait(latency).await;

        if new_comment.body.trim().is_empty() {
            return Err(Error::data_access().with_message("comment body must not be empty"));
        }

        let mut state = self.lock();
        if let Some(parent_id) = new_comment.parent_id {
            let parent_on_post = state
                .comments
                .iter()
                .any(|comment| comment.id == parent_id && comment.post_id == new_comment.post_id);

            if !parent_on_post {
                return Err(Error::data_access()
                    .with_message(format!("parent comment {parent_id} is not on this post")));
            }
        }

        let comment = Comment {
            id: Uuid::now_v7(),
            post_id: new_comment.post_id,
            parent_id: new_comment.parent_id,
            author_id: new_comment.author_id,
            body: new_comment.body,
            upvote_count: 0,
            reply_count: 0,
            created_at: Timestamp::now(),
        };

        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete(&self, comment_id: Uuid) -> Result<()> {
        let latency = self.begin(StoreOperation::Delete, None)?;
        Self::wait(latency).await;

        let mut state = self.lock();
        if !state.comments.iter().any(|comment| comment.id == comment_id) {
            return Err(Error::data_access().with_message(format!("comment {comment_id} not found")));
        }

        let removed = state.subtree(comment_id);
        state.comments.retain(|comment| !removed.contains(&comment.id));

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            %comment_id,
            removed = removed.len(),
            "Deleted comment subtree"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn test_fetch_replies_returns_direct_children_only() {
        let store = MemoryCommentStore::new();
        let (post_id, author_id) = (Uuid::now_v7(), Uuid::now_v7());

        let root = store.insert(NewComment::new(post_id, author_id, "root")).await.unwrap();
        let child = store
            .insert(NewComment::new(post_id, author_id, "child").with_parent(root.id))
            .await
            .unwrap();
        store
            .insert(NewComment::new(post_id, author_id, "grandchild").with_parent(child.id))
            .await
            .unwrap();

        let replies = store.fetch_replies(root.id).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, child.id);
        assert_eq!(replies[0].reply_count, 1);

        let top = store.fetch_top_level(post_id).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].reply_count, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_parent_from_other_post() {
        let store = MemoryCommentStore::new();
        let author_id = Uuid::now_v7();

        let other = store
            .insert(NewComment::new(Uuid::now_v7(), author_id, "elsewhere"))
            .await
            .unwrap();
        let error = store
            .insert(NewComment::new(Uuid::now_v7(), author_id, "reply").with_parent(other.id))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DataAccess);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_replies() {
        let store = MemoryCommentStore::new();
        let (post_id, author_id) = (Uuid::now_v7(), Uuid::now_v7());

        let root = store.insert(NewComment::new(post_id, author_id, "root")).await.unwrap();
        let child = store
            .insert(NewComment::new(post_id, author_id, "child").with_parent(root.id))
            .await
            .unwrap();
        store
            .insert(NewComment::new(post_id, author_id, "grandchild").with_parent(child.id))
            .await
            .unwrap();
        store.insert(NewComment::new(post_id, author_id, "sibling")).await.unwrap();

        store.delete(root.id).await.unwrap();
        let remaining = store.comments();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].body, "sibling");

        let error = store.delete(root.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DataAccess);
    }

    #[tokio::test]
    async fn test_injected_failures_are_counted() {
        let store = MemoryCommentStore::new();
        store.set_failing(StoreOperation::FetchTopLevel, true);

        let error = store.fetch_top_level(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DataAccess);
        assert_eq!(store.calls(StoreOperation::FetchTopLevel), 1);

        store.set_failing(StoreOperation::FetchTopLevel, false);
        assert!(store.fetch_top_level(Uuid::now_v7()).await.unwrap().is_empty());
        assert_eq!(store.calls(StoreOperation::FetchTopLevel), 2);
    }
}
