use std::future::Future;

use uuid::Uuid;

use super::model::{Group, NewPost, PostSummary, Vote, VoteValue};
use crate::Result;

/// Persistent storage of posts, votes and groups.
///
/// Every failure is reported as [`ErrorKind::DataAccess`](crate::ErrorKind::DataAccess).
pub trait PostStore: Send + Sync + 'static {
    /// Lists posts newest first.
    fn list_posts(
        &self,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<PostSummary>>> + Send;

    fn find_post(&self, post_id: Uuid) -> impl Future<Output = Result<Option<PostSummary>>> + Send;

    fn create_post(&self, new_post: NewPost) -> impl Future<Output = Result<PostSummary>> + Send;

    /// Deletes a post with its comments and votes.
    fn delete_post(&self, post_id: Uuid) -> impl Future<Output = Result<()>> + Send;

    /// Casts or replaces the vote of `author_id` on `post_id`.
    fn vote(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        value: VoteValue,
    ) -> impl Future<Output = Result<Vote>> + Send;

    fn my_vote(
        &self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = Result<Option<VoteValue>>> + Send;

    /// Finds groups whose name contains `search`, ignoring case.
    fn search_groups(&self, search: &str) -> impl Future<Output = Result<Vec<Group>>> + Send;
}
