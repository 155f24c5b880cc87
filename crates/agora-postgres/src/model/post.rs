//! Post model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::posts;

/// A post inside a group.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    /// Unique post identifier.
    pub id: Uuid,
    /// Group the post was published in.
    pub group_id: Uuid,
    /// Account that published the post.
    pub author_id: Uuid,
    /// Post title.
    pub title: String,
    /// Optional body text.
    pub description: Option<String>,
    /// Optional image reference.
    pub image: Option<String>,
    /// Timestamp when the post was created.
    pub created_at: Timestamp,
}

impl Post {
    /// Returns the creation time as a [`jiff::Timestamp`].
    #[inline]
    pub fn created_at(&self) -> jiff::Timestamp {
        self.created_at.into()
    }
}

/// Data for creating a new post.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    /// Group ID.
    pub group_id: Uuid,
    /// Author ID.
    pub author_id: Uuid,
    /// Post title.
    pub title: String,
    /// Body text.
    pub description: Option<String>,
    /// Image reference.
    pub image: Option<String>,
}

impl NewPost {
    /// Creates a new post with a title only.
    pub fn new(group_id: Uuid, author_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            group_id,
            author_id,
            title: title.into(),
            description: None,
            image: None,
        }
    }

    /// Sets the body text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// A post joined with its group name and aggregate counters, as shown in the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PostListing {
    /// The post itself.
    pub post: Post,
    /// Name of the group the post belongs to.
    pub group_name: String,
    /// Sum of all vote values.
    pub upvote_total: i64,
    /// Number of comments, replies included.
    pub comment_count: i64,
}
