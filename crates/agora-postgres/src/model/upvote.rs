//! Upvote model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::upvotes;

/// One account's vote on a post.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = upvotes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Upvote {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    /// Either `1` or `-1`.
    pub value: i16,
    pub created_at: Timestamp,
}

/// Data for casting or replacing a vote.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = upvotes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUpvote {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub value: i16,
}
