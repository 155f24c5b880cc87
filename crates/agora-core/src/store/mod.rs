//! Storage contract for comments.
//!
//! [`CommentStore`] is the only way the thread reaches persisted comments.
//! [`MemoryCommentStore`] keeps everything in process and supports failure
//! injection; `PgCommentStore` (feature `postgres`) talks to PostgreSQL.

mod memory;
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
mod postgres;

use std::future::Future;

pub use memory::{MemoryCommentStore, StoreOperation};
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub use postgres::PgCommentStore;
use uuid::Uuid;

use crate::Result;
use crate::comment::{Comment, NewComment};

/// Persistent storage of comments.
///
/// Every failure is reported as [`ErrorKind::DataAccess`](crate::ErrorKind::DataAccess).
/// Lists come back in insertion order.
pub trait CommentStore: Send + Sync + 'static {
    /// Lists the comments of `post_id` that have no parent.
    fn fetch_top_level(&self, post_id: Uuid) -> impl Future<Output = Result<Vec<Comment>>> + Send;

    /// Lists the direct replies of `parent_id`.
    fn fetch_replies(&self, parent_id: Uuid) -> impl Future<Output = Result<Vec<Comment>>> + Send;

    /// Stores a new comment and returns it with its assigned id.
    fn insert(&self, new_comment: NewComment) -> impl Future<Output = Result<Comment>> + Send;

    /// Deletes a comment and its reply subtree.
    fn delete(&self, comment_id: Uuid) -> impl Future<Output = Result<()>> + Send;
}
