//! Comment domain types and the cache keys of comment lists.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::QueryKey;

/// Maximum nesting depth at which replies can still be expanded.
///
/// Top-level comments have depth 0; a comment at this depth never offers
/// to show its replies, even when it has some.
pub const MAX_REPLY_DEPTH: usize = 5;

/// Maximum length of a comment body in characters.
pub const MAX_BODY_LENGTH: usize = 10_000;

/// A comment as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier assigned by the store.
    pub id: Uuid,
    /// Post the comment belongs to.
    pub post_id: Uuid,
    /// Comment this one replies to; `None` for top-level comments.
    pub parent_id: Option<Uuid>,
    /// Account that wrote the comment.
    pub author_id: Uuid,
    /// Comment text.
    pub body: String,
    /// Aggregate vote count, read-only here.
    pub upvote_count: i64,
    /// Number of direct replies when the comment was fetched.
    pub reply_count: u64,
    /// Creation time.
    pub created_at: Timestamp,
}

impl Comment {
    /// Returns whether the comment is attached directly to the post.
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns whether the comment had replies when it was fetched.
    #[inline]
    pub fn has_replies(&self) -> bool {
        self.reply_count > 0
    }

    /// Returns whether `user_id` wrote this comment.
    #[inline]
    pub fn is_authored_by(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.author_id)
    }
}

/// Data for inserting a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub body: String,
}

impl NewComment {
    /// Creates a top-level comment on `post_id`.
    pub fn new(post_id: Uuid, author_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            post_id,
            parent_id: None,
            author_id,
            body: body.into(),
        }
    }

    /// Turns the comment into a reply to `parent_id`.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Cache key of a comment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentQuery {
    /// Comments of a post without a parent.
    TopLevel { post_id: Uuid },
    /// Direct replies of a comment.
    Replies { parent_id: Uuid },
}

impl CommentQuery {
    /// Returns the key of the list a comment with this post and parent appears in.
    pub fn list_of(post_id: Uuid, parent_id: Option<Uuid>) -> Self {
        match parent_id {
            Some(parent_id) => CommentQuery::Replies { parent_id },
            None => CommentQuery::TopLevel { post_id },
        }
    }
}

impl QueryKey for CommentQuery {
    fn stale_time(&self) -> Duration {
        // Comment lists are re-read on every access.
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_of() {
        let post_id = Uuid::now_v7();
        let parent_id = Uuid::now_v7();

        assert_eq!(
            CommentQuery::list_of(post_id, None),
            CommentQuery::TopLevel { post_id }
        );
        assert_eq!(
            CommentQuery::list_of(post_id, Some(parent_id)),
            CommentQuery::Replies { parent_id }
        );
    }

    #[test]
    fn test_query_serializes_with_kind_tag() {
        let parent_id = Uuid::nil();
        let json = serde_json::to_value(CommentQuery::Replies { parent_id }).unwrap();
        assert_eq!(json["kind"], "replies");
        assert_eq!(json["parent_id"], parent_id.to_string());
    }
}
