//! Threaded comment tree of one post.
//!
//! A [`CommentThread`] owns the visible tree: top-level comments and, for every
//! expanded comment, its loaded replies. Replies are read through the shared
//! [`QueryCache`](crate::cache::QueryCache) on demand. Submitting or deleting a
//! comment goes to the store, invalidates the affected comment lists and
//! refreshes the tree so that every surviving node keeps its expansion state.

mod comment_node;
mod comment_thread;
mod thread_line;

pub use comment_node::{CommentNode, NodeState};
pub use comment_thread::{CommentThread, ReplyLoad};
pub use thread_line::{Affordances, ThreadLine};
