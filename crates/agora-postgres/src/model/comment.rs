//! Comment model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::comments;

/// A comment on a post, either top-level or a reply to another comment.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    /// Unique comment identifier.
    pub id: Uuid,
    /// Post the comment belongs to.
    pub post_id: Uuid,
    /// Parent comment (NULL for top-level comments).
    pub parent_id: Option<Uuid>,
    /// Account that wrote the comment.
    pub author_id: Uuid,
    /// Comment text.
    pub body: String,
    /// Aggregate vote count.
    pub upvote_count: i64,
    /// Timestamp when the comment was created.
    pub created_at: Timestamp,
}

/// Data for creating a new comment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComment {
    /// Post ID.
    pub post_id: Uuid,
    /// Parent comment ID for replies.
    pub parent_id: Option<Uuid>,
    /// Author ID.
    pub author_id: Uuid,
    /// Comment text.
    pub body: String,
}

impl Comment {
    /// Returns whether this is a top-level comment.
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns the creation time as a [`jiff::Timestamp`].
    #[inline]
    pub fn created_at(&self) -> jiff::Timestamp {
        self.created_at.into()
    }

    /// Returns whether the given account wrote this comment.
    #[inline]
    pub fn is_authored_by(&self, account_id: Uuid) -> bool {
        self.author_id == account_id
    }
}

impl NewComment {
    /// Creates a new top-level comment on a post.
    pub fn for_post(post_id: Uuid, author_id: Uuid, body: impl Into<String>) -> Self {
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
