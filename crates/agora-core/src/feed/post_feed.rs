use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::feed_query::{FEED_PAGE_SIZE, FeedQuery};
use super::model::{Group, NewPost, PostSummary, Vote, VoteValue};
use super::post_store::PostStore;
use crate::cache::QueryCache;
use crate::session::SessionProvider;
use crate::{Error, Result, TRACING_TARGET_FEED};

/// Infinite-scroll post feed with cached reads.
pub struct PostFeed<S> {
    store: Arc<S>,
    session: Arc<dyn SessionProvider>,
    pages: QueryCache<FeedQuery, Vec<PostSummary>>,
    posts: QueryCache<FeedQuery, Option<PostSummary>>,
    groups: QueryCache<FeedQuery, Vec<Group>>,
    page_size: usize,
    loaded: Vec<PostSummary>,
    next_offset: usize,
    exhausted: bool,
}

impl<S: PostStore> PostFeed<S> {
    /// Creates an empty feed loading [`FEED_PAGE_SIZE`] posts per page.
    pub fn new(store: Arc<S>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            store,
            session,
            pages: QueryCache::new(),
            posts: QueryCache::new(),
            groups: QueryCache::new(),
            page_size: FEED_PAGE_SIZE,
            loaded: Vec::new(),
            next_offset: 0,
            exhausted: false,
        }
    }

    /// Sets the number of posts per page (at least one).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the posts loaded so far, newest first.
    pub fn posts(&self) -> &[PostSummary] {
        &self.loaded
    }

    /// Returns whether the last page has been loaded.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns the cache of feed pages.
    pub fn page_cache(&self) -> &QueryCache<FeedQuery, Vec<PostSummary>> {
        &self.pages
    }

    /// Loads the next page and returns how many posts it held.
    ///
    /// A page shorter than the page size marks the feed as exhausted; later
    /// calls return zero without touching the store.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_FEED, fields(offset = self.next_offset))]
    pub async fn load_next_page(&mut self) -> Result<usize> {
        if self.exhausted {
            return Ok(0);
        }

        let (limit, offset) = (self.page_size, self.next_offset);
        let store = Arc::clone(&self.store);
        let page = self
            .pages
            .read(FeedQuery::Page { limit, offset }, move || async move {
                store.list_posts(limit, offset).await
            })
            .await?;

        let count = page.len();
        self.next_offset += count;
        if count < limit {
            tracing::debug!(target: TRACING_TARGET_FEED, total = self.next_offset, "Feed exhausted");
            self.exhausted = true;
        }

        let known: HashSet<Uuid> = self.loaded.iter().map(|post| post.id).collect();
        self.loaded
            .extend(page.into_iter().filter(|post| !known.contains(&post.id)));

        Ok(count)
    }

    /// Drops every cached page and loads the first one again.
    pub async fn reload(&mut self) -> Result<usize> {
        self.pages.invalidate(FeedQuery::is_page);
        self.loaded.clear();
        self.next_offset = 0;
        self.exhausted = false;
        self.load_next_page().await
    }

    /// Reads a single post.
    pub async fn post(&self, post_id: Uuid) -> Result<Option<PostSummary>> {
        let store = Arc::clone(&self.store);
        self.posts
            .read(FeedQuery::Post { id: post_id }, move || async move {
                store.find_post(post_id).await
            })
            .await
    }

    /// Searches groups by name.
    pub async fn search_groups(&self, search: &str) -> Result<Vec<Group>> {
        let search = search.trim().to_owned();
        let store = Arc::clone(&self.store);
        let key = FeedQuery::Groups {
            search: search.clone(),
        };

        self.groups
            .read(key, move || async move { store.search_groups(&search).await })
            .await
    }

    /// Returns the signed-in user's vote on a post; `None` when signed out.
    pub async fn my_vote(&self, post_id: Uuid) -> Result<Option<VoteValue>> {
        match self.session.current_user_id() {
            Some(author_id) => self.store.my_vote(post_id, author_id).await,
            None => Ok(None),
        }
    }

    /// Votes on a post as the signed-in user.
    ///
    /// The post and every page are invalidated and the loaded copy of the
    /// post is refreshed.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_FEED)]
    pub async fn vote(&mut self, post_id: Uuid, value: VoteValue) -> Result<Vote> {
        let author_id = self.signed_in_user("sign in to vote")?;
        let vote = self.store.vote(post_id, author_id, value).await?;

        self.posts.invalidate_key(&FeedQuery::Post { id: post_id });
        self.pages.invalidate(FeedQuery::is_page);

        match self.post(post_id).await {
            Ok(Some(fresh)) => {
                if let Some(loaded) = self.loaded.iter_mut().find(|post| post.id == post_id) {
                    *loaded = fresh;
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(target: TRACING_TARGET_FEED, %post_id, error = %error, "Failed to re-read voted post");
            }
        }

        Ok(vote)
    }

    /// Creates a post as the signed-in user and invalidates every page.
    #[tracing::instrument(skip(self, new_post), target = TRACING_TARGET_FEED, fields(group_id = %new_post.group_id))]
    pub async fn create_post(&mut self, new_post: NewPost) -> Result<PostSummary> {
        let author_id = self.signed_in_user("sign in to post")?;
        if new_post.author_id != author_id {
            return Err(Error::forbidden().with_message("posts can only be made as yourself"));
        }

        let new_post = new_post.validated()?;
        let post = self.store.create_post(new_post).await?;

        tracing::info!(target: TRACING_TARGET_FEED, post_id = %post.id, "Post created");
        self.pages.invalidate(FeedQuery::is_page);
        Ok(post)
    }

    /// Deletes a post written by the signed-in user.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_FEED)]
    pub async fn delete_post(&mut self, post_id: Uuid) -> Result<()> {
        let post = self
            .post(post_id)
            .await?
            .ok_or_else(|| Error::not_found().with_message(format!("post {post_id} not found")))?;

        if !post.is_authored_by(self.session.current_user_id()) {
            return Err(Error::forbidden().with_message("only the author may delete a post"));
        }

        self.store.delete_post(post_id).await?;

        self.posts.remove(&FeedQuery::Post { id: post_id });
        self.pages.invalidate(FeedQuery::is_page);
        // The server-side list shrank by one; keep the cursor on the same boundary.
        let before = self.loaded.len();
        self.loaded.retain(|post| post.id != post_id);
        if self.loaded.len() < before {
            self.next_offset = self.next_offset.saturating_sub(1);
        }
        Ok(())
    }

    fn signed_in_user(&self, message: &str) -> Result<Uuid> {
        self.session
            .current_user_id()
            .ok_or_else(|| Error::forbidden().with_message(message))
    }
}

impl<S> fmt::Debug for PostFeed<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostFeed")
            .field("page_size", &self.page_size)
            .field("loaded", &self.loaded.len())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
