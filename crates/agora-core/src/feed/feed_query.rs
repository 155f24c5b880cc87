use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::QueryKey;

/// How long feed pages, posts and group searches stay fresh.
pub const FEED_STALE_TIME: Duration = Duration::from_secs(10);

/// Number of posts loaded per page.
pub const FEED_PAGE_SIZE: usize = 10;

/// Cache key of a feed query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedQuery {
    /// One page of the newest posts.
    Page { limit: usize, offset: usize },
    /// A single post.
    Post { id: Uuid },
    /// Groups whose name contains `search`.
    Groups { search: String },
}

impl FeedQuery {
    /// Returns whether the key addresses a feed page.
    pub fn is_page(&self) -> bool {
        matches!(self, FeedQuery::Page { .. })
    }
}

impl QueryKey for FeedQuery {
    fn stale_time(&self) -> Duration {
        FEED_STALE_TIME
    }
}
