//! Keyed query cache shared by every view of a session.
//!
//! A [`QueryCache`] stores the last result of each query together with the time it was
//! fetched. Reads serve fresh entries directly and refetch stale or missing ones;
//! concurrent reads of the same key share a single fetch. Mutations mark entries stale
//! through [`QueryCache::invalidate`] so that the next read goes back to the store.

mod query_cache;

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

pub use query_cache::QueryCache;
use tokio::time::Instant;

use crate::Error;

/// Identifies one cached query, such as "replies of comment X".
pub trait QueryKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// How long a successful result stays fresh after it was fetched.
    ///
    /// A zero duration makes every read refetch, while still sharing
    /// concurrent fetches.
    fn stale_time(&self) -> Duration;
}

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntryStatus {
    /// Created but no fetch has completed yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed.
    Error,
}

/// Point-in-time copy of a cache entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot<V> {
    /// Data of the last successful fetch, if any.
    pub data: Option<V>,
    /// Error of the last fetch, if it failed.
    pub error: Option<Error>,
    /// Current status.
    pub status: EntryStatus,
    /// When the last successful fetch completed.
    pub fetched_at: Option<Instant>,
    /// Whether the next read will refetch.
    pub is_stale: bool,
    /// Whether a fetch is currently in flight.
    pub is_fetching: bool,
}

/// Change notification emitted by a [`QueryCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent<K> {
    /// A fetch for the key completed, successfully or not.
    Updated(K),
    /// The key was marked stale.
    Invalidated(K),
    /// The key was removed.
    Removed(K),
}

impl<K> CacheEvent<K> {
    /// Returns the key the event is about.
    pub fn key(&self) -> &K {
        match self {
            CacheEvent::Updated(key) | CacheEvent::Invalidated(key) | CacheEvent::Removed(key) => {
                key
            }
        }
    }
}
