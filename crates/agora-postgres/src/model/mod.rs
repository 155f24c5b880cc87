//! Models for PostgreSQL database operations.
//!
//! Each table has a `Queryable` row type and an `Insertable` `New*` type.

mod account;
mod comment;
mod group;
mod post;
mod upvote;

pub use account::{Account, NewAccount};
pub use comment::{Comment, NewComment};
pub use group::{Group, NewGroup};
pub use post::{NewPost, Post, PostListing};
pub use upvote::{NewUpvote, Upvote};
