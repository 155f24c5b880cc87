//! Post feed, votes and group search.
//!
//! [`PostFeed`] pages through the newest posts with infinite scroll and caches
//! pages, single posts and group searches in [`QueryCache`](crate::cache::QueryCache)s
//! keyed by [`FeedQuery`].

mod feed_query;
mod memory;
mod model;
mod post_feed;
mod post_store;
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
mod postgres;

pub use feed_query::{FEED_PAGE_SIZE, FEED_STALE_TIME, FeedQuery};
pub use memory::{MemoryPostStore, PostOperation};
pub use model::{Group, MAX_TITLE_LENGTH, NewPost, PostSummary, Vote, VoteValue, upvote_total};
pub use post_feed::PostFeed;
pub use post_store::PostStore;
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub use postgres::PgPostStore;
