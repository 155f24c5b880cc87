use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jiff::Timestamp;
use uuid::Uuid;

use super::model::{Group, NewPost, PostSummary, Vote, VoteValue, upvote_total};
use super::post_store::PostStore;
use crate::store::MemoryCommentStore;
use crate::{Error, Result, TRACING_TARGET_STORE};

/// Maximum number of groups a search returns.
const SEARCH_LIMIT: usize = 25;

/// Operations of a [`PostStore`], used for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PostOperation {
    ListPosts,
    FindPost,
    CreatePost,
    DeletePost,
    Vote,
    MyVote,
    SearchGroups,
}

#[derive(Debug, Clone)]
struct StoredPost {
    id: Uuid,
    group_id: Uuid,
    author_id: Uuid,
    title: String,
    description: Option<String>,
    image: Option<String>,
    created_at: Timestamp,
}

#[derive(Debug, Default)]
struct MemoryState {
    groups: Vec<Group>,
    posts: Vec<StoredPost>,
    votes: Vec<Vote>,
    failing: HashSet<PostOperation>,
    calls: HashMap<PostOperation, usize>,
}

/// In-process [`PostStore`].
///
/// Comment counts come from an attached [`MemoryCommentStore`], if any.
#[derive(Debug, Clone, Default)]
pub struct MemoryPostStore {
    inner: Arc<Mutex<MemoryState>>,
    comments: Option<MemoryCommentStore>,
}

impl MemoryPostStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts comments of `comments` in post listings.
    pub fn with_comments(mut self, comments: MemoryCommentStore) -> Self {
        self.comments = Some(comments);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a group and returns it.
    pub fn add_group(&self, name: impl Into<String>) -> Group {
        let group = Group {
            id: Uuid::now_v7(),
            name: name.into(),
            image: None,
        };

        self.lock().groups.push(group.clone());
        group
    }

    /// Makes every later call of `operation` fail, or succeed again.
    pub fn set_failing(&self, operation: PostOperation, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    /// Returns how many times `operation` was called.
    pub fn calls(&self, operation: PostOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or_default()
    }

    fn begin(&self, operation: PostOperation) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_default() += 1;

        if state.failing.contains(&operation) {
            tracing::debug!(target: TRACING_TARGET_STORE, %operation, "Injected store failure");
            return Err(Error::data_access().with_message(format!("{operation} failed")));
        }

        Ok(state)
    }

    fn summarize(&self, state: &MemoryState, post: &StoredPost) -> PostSummary {
        let votes: Vec<Vote> = state
            .votes
            .iter()
            .filter(|vote| vote.post_id == post.id)
            .copied()
            .collect();

        let comment_count = self.comments.as_ref().map_or(0, |comments| {
            comments
                .comments()
                .iter()
                .filter(|comment| comment.post_id == post.id)
                .count() as u64
        });

        let group_name = state
            .groups
            .iter()
            .find(|group| group.id == post.group_id)
            .map(|group| group.name.clone())
            .unwrap_or_default();

        PostSummary {
            id: post.id,
            group_id: post.group_id,
            group_name,
            author_id: post.author_id,
            title: post.title.clone(),
            description: post.description.clone(),
            image: post.image.clone(),
            upvote_total: upvote_total(&votes),
            comment_count,
            created_at: post.created_at,
        }
    }
}

impl PostStore for MemoryPostStore {
    async fn list_posts(&self, limit: usize, offset: usize) -> Result<Vec<PostSummary>> {
        let state = self.begin(PostOperation::ListPosts)?;
        Ok(state
            .posts
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|post| self.summarize(&state, post))
            .collect())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>> {
        let state = self.begin(PostOperation::FindPost)?;
        Ok(state
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| self.summarize(&state, post)))
    }

    async fn create_post(&self, new_post: NewPost) -> Result<PostSummary> {
        let mut state = self.begin(PostOperation::CreatePost)?;
        if !state.groups.iter().any(|group| group.id == new_post.group_id) {
            return Err(Error::data_access()
                .with_message(format!("group {} does not exist", new_post.group_id)));
        }

        let post = StoredPost {
            id: Uuid::now_v7(),
            group_id: new_post.group_id,
            author_id: new_post.author_id,
            title: new_post.title,
            description: new_post.description,
            image: new_post.image,
            created_at: Timestamp::now(),
        };

        state.posts.push(post.clone());
        Ok(self.summarize(&state, &post))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        let mut state = self.begin(PostOperation::DeletePost)?;
        let before = state.posts.len();
        state.posts.retain(|post| post.id != post_id);

        if state.posts.len() == before {
            return Err(Error::data_access().with_message(format!("post {post_id} not found")));
        }

        state.votes.retain(|vote| vote.post_id != post_id);
        Ok(())
    }

    async fn vote(&self, post_id: Uuid, author_id: Uuid, value: VoteValue) -> Result<Vote> {
        let mut state = self.begin(PostOperation::Vote)?;
        if !state.posts.iter().any(|post| post.id == post_id) {
            return Err(Error::data_access().with_message(format!("post {post_id} not found")));
        }

        let vote = Vote {
            post_id,
            author_id,
            value,
        };

        let existing = state
            .votes
            .iter()
            .position(|existing| existing.post_id == post_id && existing.author_id == author_id);

        match existing {
            Some(index) => state.votes[index].value = value,
            None => state.votes.push(vote),
        }

        Ok(vote)
    }

    async fn my_vote(&self, post_id: Uuid, author_id: Uuid) -> Result<Option<VoteValue>> {
        let state = self.begin(PostOperation::MyVote)?;
        Ok(state
            .votes
            .iter()
            .find(|vote| vote.post_id == post_id && vote.author_id == author_id)
            .map(|vote| vote.value))
    }

    async fn search_groups(&self, search: &str) -> Result<Vec<Group>> {
        let state = self.begin(PostOperation::SearchGroups)?;
        let needle = search.to_lowercase();

        let mut groups: Vec<Group> = state
            .groups
            .iter()
            .filter(|group| group.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups.truncate(SEARCH_LIMIT);

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::comment::NewComment;
    use crate::store::CommentStore;

    #[tokio::test]
    async fn test_list_posts_newest_first_with_counters() {
        let comments = MemoryCommentStore::new();
        let store = MemoryPostStore::new().with_comments(comments.clone());
        let group = store.add_group("rust");
        let author_id = Uuid::now_v7();

        let first = store
            .create_post(NewPost::new(group.id, author_id, "first"))
            .await
            .unwrap();
        let second = store
            .create_post(NewPost::new(group.id, author_id, "second"))
            .await
            .unwrap();

        comments
            .insert(NewComment::new(first.id, author_id, "nice"))
            .await
            .unwrap();
        store.vote(first.id, author_id, VoteValue::Up).await.unwrap();
        store.vote(first.id, Uuid::now_v7(), VoteValue::Up).await.unwrap();
        store.vote(first.id, author_id, VoteValue::Down).await.unwrap();

        let posts = store.list_posts(10, 0).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].upvote_total, 0);
        assert_eq!(posts[1].comment_count, 1);
        assert_eq!(posts[1].group_name, "rust");

        let page = store.list_posts(1, 1).await.unwrap();
        assert_eq!(page[0].id, first.id);
    }

    #[tokio::test]
    async fn test_create_post_requires_group() {
        let store = MemoryPostStore::new();
        let error = store
            .create_post(NewPost::new(Uuid::now_v7(), Uuid::now_v7(), "orphan"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DataAccess);
        assert_eq!(store.calls(PostOperation::CreatePost), 1);
    }

    #[tokio::test]
    async fn test_search_groups_ignores_case() {
        let store = MemoryPostStore::new();
        store.add_group("Rustaceans");
        store.add_group("gophers");
        store.add_group("rust-embedded");

        let found = store.search_groups("RUST").await.unwrap();
        let names: Vec<_> = found.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, ["Rustaceans", "rust-embedded"]);
    }
}
