use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, FutureExt};
use uuid::Uuid;

use super::comment_node::{self, CommentNode};
use super::thread_line::{self, ThreadLine};
use crate::cache::QueryCache;
use crate::comment::{Comment, CommentQuery, MAX_REPLY_DEPTH, NewComment};
use crate::composer::ReplyComposer;
use crate::session::SessionProvider;
use crate::store::CommentStore;
use crate::{Error, Result, TRACING_TARGET_THREAD};

/// Pending reply fetch started by [`CommentThread::request_expand`].
///
/// Resolves to the replies of [`ReplyLoad::parent_id`]; hand the result to
/// [`CommentThread::apply_replies`]. Loads of different comments are
/// independent and may be awaited in any order.
#[must_use = "the replies are only shown once applied to the thread"]
pub struct ReplyLoad {
    parent_id: Uuid,
    fetch: BoxFuture<'static, Result<Vec<Comment>>>,
}

impl ReplyLoad {
    /// Returns the comment whose replies are loading.
    pub fn parent_id(&self) -> Uuid {
        self.parent_id
    }
}

impl Future for ReplyLoad {
    type Output = Result<Vec<Comment>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.fetch.poll_unpin(cx)
    }
}

impl fmt::Debug for ReplyLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyLoad")
            .field("parent_id", &self.parent_id)
            .finish_non_exhaustive()
    }
}

/// Comment tree of a single post.
pub struct CommentThread<S> {
    post_id: Uuid,
    store: Arc<S>,
    session: Arc<dyn SessionProvider>,
    cache: QueryCache<CommentQuery, Vec<Comment>>,
    roots: Vec<CommentNode>,
    composer: ReplyComposer,
    top_level_error: Option<Error>,
}

impl<S: CommentStore> CommentThread<S> {
    /// Creates an empty thread with its own cache. Call [`Self::refresh`] to load it.
    pub fn new(post_id: Uuid, store: Arc<S>, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_cache(post_id, store, session, QueryCache::new())
    }

    /// Creates an empty thread reading through a shared cache.
    pub fn with_cache(
        post_id: Uuid,
        store: Arc<S>,
        session: Arc<dyn SessionProvider>,
        cache: QueryCache<CommentQuery, Vec<Comment>>,
    ) -> Self {
        Self {
            post_id,
            store,
            session,
            cache,
            roots: Vec::new(),
            composer: ReplyComposer::new(),
            top_level_error: None,
        }
    }

    /// Returns the post this thread belongs to.
    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    /// Returns the cache the thread reads through.
    pub fn cache(&self) -> &QueryCache<CommentQuery, Vec<Comment>> {
        &self.cache
    }

    /// Returns the top-level nodes.
    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    /// Returns the node of `comment_id` if it is part of the loaded tree.
    pub fn node(&self, comment_id: Uuid) -> Option<&CommentNode> {
        comment_node::find(&self.roots, comment_id)
    }

    /// Returns the error of the last failed top-level read.
    pub fn top_level_error(&self) -> Option<&Error> {
        self.top_level_error.as_ref()
    }

    /// Returns the reply composer attached to this thread.
    pub fn composer(&self) -> &ReplyComposer {
        &self.composer
    }

    /// Returns the reply composer for editing a draft or switching its target.
    pub fn composer_mut(&mut self) -> &mut ReplyComposer {
        &mut self.composer
    }

    /// Targets the composer at a loaded comment.
    pub fn begin_reply(&mut self, comment_id: Uuid) -> Result<()> {
        if self.node(comment_id).is_none() {
            return Err(missing_node(comment_id));
        }

        self.composer.set_reply_target(comment_id);
        Ok(())
    }

    /// Flattens the visible tree for `viewer`, in display order.
    pub fn lines(&self, viewer: Option<Uuid>) -> Vec<ThreadLine<'_>> {
        let mut lines = Vec::new();
        thread_line::flatten(&self.roots, viewer, &mut lines);
        lines
    }

    fn read_list(&self, key: CommentQuery) -> BoxFuture<'static, Result<Vec<Comment>>> {
        let cache = self.cache.clone();
        let store = Arc::clone(&self.store);

        async move {
            cache
                .read(key, move || async move {
                    match key {
                        CommentQuery::TopLevel { post_id } => store.fetch_top_level(post_id).await,
                        CommentQuery::Replies { parent_id } => {
                            store.fetch_replies(parent_id).await
                        }
                    }
                })
                .await
        }
        .boxed()
    }

    /// Marks `comment_id` as loading and starts reading its replies.
    ///
    /// Fails with `NotFound` when the comment is not in the tree and with
    /// `Validation` when it sits at [`MAX_REPLY_DEPTH`] or deeper.
    pub fn request_expand(&mut self, comment_id: Uuid) -> Result<ReplyLoad> {
        let node = comment_node::find_mut(&mut self.roots, comment_id)
            .ok_or_else(|| missing_node(comment_id))?;

        if node.depth() >= MAX_REPLY_DEPTH {
            return Err(Error::validation().with_message(format!(
                "replies deeper than {MAX_REPLY_DEPTH} levels are not expanded"
            )));
        }

        node.start_loading();
        tracing::debug!(target: TRACING_TARGET_THREAD, %comment_id, "Loading replies");

        Ok(ReplyLoad {
            parent_id: comment_id,
            fetch: self.read_list(CommentQuery::Replies {
                parent_id: comment_id,
            }),
        })
    }

    /// Applies the outcome of a reply load.
    ///
    /// Returns `false` without changing anything when the node is gone or no
    /// longer loading, for instance because it was collapsed meanwhile.
    pub fn apply_replies(&mut self, comment_id: Uuid, result: Result<Vec<Comment>>) -> bool {
        let Some(node) = comment_node::find_mut(&mut self.roots, comment_id) else {
            tracing::trace!(target: TRACING_TARGET_THREAD, %comment_id, "Replies for removed comment ignored");
            return false;
        };

        if !node.state().is_loading() {
            tracing::trace!(target: TRACING_TARGET_THREAD, %comment_id, "Replies for settled comment ignored");
            return false;
        }

        match result {
            Ok(replies) => node.set_replies(replies),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_THREAD,
                    %comment_id,
                    error = %error,
                    "Failed to load replies"
                );
                node.fail(error);
            }
        }

        true
    }

    /// Loads and shows the replies of `comment_id`.
    ///
    /// A failed load leaves the node in `CollapsedWithError` and is returned.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_THREAD, fields(post_id = %self.post_id))]
    pub async fn expand(&mut self, comment_id: Uuid) -> Result<()> {
        let load = self.request_expand(comment_id)?;
        let result = load.await;
        let outcome = result.as_ref().map(|_| ()).map_err(Error::clone);

        self.apply_replies(comment_id, result);
        outcome
    }

    /// Hides the replies of `comment_id`.
    pub fn collapse(&mut self, comment_id: Uuid) -> Result<()> {
        let node = comment_node::find_mut(&mut self.roots, comment_id)
            .ok_or_else(|| missing_node(comment_id))?;

        node.collapse();
        Ok(())
    }

    /// Re-reads the top-level list and the replies of every expanded comment.
    ///
    /// Replies are read level by level with siblings in parallel. A failed
    /// reply read collapses that comment with its error; a failed top-level
    /// read is returned and leaves the tree untouched.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_THREAD, fields(post_id = %self.post_id))]
    pub async fn refresh(&mut self) -> Result<()> {
        let top_level = self
            .read_list(CommentQuery::TopLevel {
                post_id: self.post_id,
            })
            .await;

        let top_level = match top_level {
            Ok(comments) => comments,
            Err(error) => {
                self.top_level_error = Some(error.clone());
                return Err(error);
            }
        };

        self.top_level_error = None;
        let roots = std::mem::take(&mut self.roots);
        self.roots = comment_node::merge_level(roots, top_level, 0);

        let mut level = expanded_ids(&self.roots);
        while !level.is_empty() {
            let reads: Vec<_> = level
                .iter()
                .map(|&parent_id| self.read_list(CommentQuery::Replies { parent_id }))
                .collect();
            let results = future::join_all(reads).await;

            let mut next_level = Vec::new();
            for (parent_id, result) in level.into_iter().zip(results) {
                let Some(node) = comment_node::find_mut(&mut self.roots, parent_id) else {
                    continue;
                };

                match result {
                    Ok(replies) => {
                        node.set_replies(replies);
                        next_level.extend(expanded_ids(node.children()));
                    }
                    Err(error) => {
                        tracing::warn!(
                            target: TRACING_TARGET_THREAD,
                            comment_id = %parent_id,
                            error = %error,
                            "Failed to refresh replies"
                        );
                        node.fail(error);
                    }
                }
            }

            level = next_level;
        }

        tracing::debug!(target: TRACING_TARGET_THREAD, roots = self.roots.len(), "Thread refreshed");
        Ok(())
    }

    /// Deletes a comment written by the signed-in user, then refreshes.
    ///
    /// Anyone else gets `Forbidden` and the store is not called.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_THREAD, fields(post_id = %self.post_id))]
    pub async fn delete(&mut self, comment_id: Uuid) -> Result<()> {
        let node = self.node(comment_id).ok_or_else(|| missing_node(comment_id))?;
        let comment = node.comment();

        if !comment.is_authored_by(self.session.current_user_id()) {
            return Err(Error::forbidden().with_message("only the author may delete a comment"));
        }

        let holding_list = CommentQuery::list_of(comment.post_id, comment.parent_id);
        let parent_list = comment
            .parent_id
            .and_then(|parent_id| self.node(parent_id))
            .map(|parent| CommentQuery::list_of(parent.comment().post_id, parent.comment().parent_id));

        self.store.delete(comment_id).await?;

        self.cache
            .invalidate(|key| *key == holding_list || Some(*key) == parent_list);
        self.cache.remove(&CommentQuery::Replies {
            parent_id: comment_id,
        });

        if let Err(error) = self.refresh().await {
            tracing::warn!(target: TRACING_TARGET_THREAD, error = %error, "Refresh after delete failed");
        }

        Ok(())
    }

    /// Posts the composer's draft as the signed-in user, then refreshes.
    ///
    /// The draft must not be blank and the reply target, if any, must be in the
    /// tree. The composer is cleared only once the store accepted the comment.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_THREAD, fields(post_id = %self.post_id))]
    pub async fn submit(&mut self) -> Result<Comment> {
        let body = self.composer.validated_body()?.to_owned();
        let author_id = self
            .session
            .current_user_id()
            .ok_or_else(|| Error::forbidden().with_message("sign in to comment"))?;

        let reply_target = self.composer.reply_target();
        let target_list = match reply_target {
            Some(target_id) => {
                let target = self.node(target_id).ok_or_else(|| missing_node(target_id))?;
                Some(CommentQuery::list_of(
                    target.comment().post_id,
                    target.comment().parent_id,
                ))
            }
            None => None,
        };

        let mut new_comment = NewComment::new(self.post_id, author_id, body);
        if let Some(target_id) = reply_target {
            new_comment = new_comment.with_parent(target_id);
        }

        let comment = self.store.insert(new_comment).await?;
        tracing::info!(target: TRACING_TARGET_THREAD, comment_id = %comment.id, "Comment created");

        self.composer.reset();
        let receiving_list = CommentQuery::list_of(self.post_id, reply_target);
        self.cache
            .invalidate(|key| *key == receiving_list || Some(*key) == target_list);

        if let Err(error) = self.refresh().await {
            tracing::warn!(target: TRACING_TARGET_THREAD, error = %error, "Refresh after submit failed");
        }

        Ok(comment)
    }
}

impl<S> fmt::Debug for CommentThread<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentThread")
            .field("post_id", &self.post_id)
            .field("roots", &self.roots.len())
            .field("composer", &self.composer)
            .finish_non_exhaustive()
    }
}

fn expanded_ids(nodes: &[CommentNode]) -> Vec<Uuid> {
    nodes
        .iter()
        .filter(|node| node.state().is_expanded())
        .map(|node| node.comment().id)
        .collect()
}

fn missing_node(comment_id: Uuid) -> Error {
    Error::not_found().with_message(format!("comment {comment_id} is not in the thread"))
}
