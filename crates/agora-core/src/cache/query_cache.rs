use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::{CacheEvent, EntrySnapshot, EntryStatus, QueryKey};
use crate::{Error, Result, TRACING_TARGET_CACHE};

/// Capacity of the change notification channel.
const EVENT_CAPACITY: usize = 256;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

struct Entry<V> {
    data: Option<V>,
    error: Option<Error>,
    status: EntryStatus,
    fetched_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<(u64, SharedFetch<V>)>,
}

impl<V: Clone> Entry<V> {
    fn new() -> Self {
        Self {
            data: None,
            error: None,
            status: EntryStatus::Idle,
            fetched_at: None,
            invalidated: false,
            in_flight: None,
        }
    }

    fn is_stale<K: QueryKey>(&self, key: &K, now: Instant) -> bool {
        if self.invalidated || self.status != EntryStatus::Success {
            return true;
        }

        match self.fetched_at {
            Some(fetched_at) => now.saturating_duration_since(fetched_at) >= key.stale_time(),
            None => true,
        }
    }

    fn snapshot<K: QueryKey>(&self, key: &K, now: Instant) -> EntrySnapshot<V> {
        EntrySnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
            fetched_at: self.fetched_at,
            is_stale: self.is_stale(key, now),
            is_fetching: self.in_flight.is_some(),
        }
    }
}

struct Inner<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    events: broadcast::Sender<CacheEvent<K>>,
    next_fetch_id: AtomicU64,
}

impl<K: QueryKey, V: Clone> Inner<K, V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: CacheEvent<K>) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }

    /// Records the outcome of a fetch unless the entry was removed or refetched since.
    fn complete(&self, key: &K, fetch_id: u64, result: &Result<V>) {
        {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                tracing::trace!(target: TRACING_TARGET_CACHE, key = ?key, "Dropping result for removed entry");
                return;
            };

            if !matches!(entry.in_flight, Some((id, _)) if id == fetch_id) {
                return;
            }

            entry.in_flight = None;
            match result {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.error = None;
                    entry.status = EntryStatus::Success;
                    entry.fetched_at = Some(Instant::now());
                }
                Err(error) => {
                    tracing::debug!(
                        target: TRACING_TARGET_CACHE,
                        key = ?key,
                        error = %error,
                        "Query fetch failed"
                    );
                    entry.error = Some(error.clone());
                    entry.status = EntryStatus::Error;
                }
            }
        }

        self.notify(CacheEvent::Updated(key.clone()));
    }
}

/// Keyed cache with per-key staleness and single-flight reads.
///
/// The cache is a cheap handle: clones share the same entries. Fetches run as
/// tokio tasks, so a fetch keeps going and its result is cached even when every
/// caller waiting on it goes away.
///
/// ```rust,no_run
/// # use std::time::Duration;
/// # use agora_core::cache::{QueryCache, QueryKey};
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// struct Answer;
///
/// impl QueryKey for Answer {
///     fn stale_time(&self) -> Duration {
///         Duration::from_secs(10)
///     }
/// }
///
/// # async fn example() -> agora_core::Result<()> {
/// let cache = QueryCache::<Answer, u32>::new();
/// let value = cache.read(Answer, || async { Ok(42) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
pub struct QueryCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: QueryKey,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                events,
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the cached value for `key`, fetching it first when missing or stale.
    ///
    /// When a fetch for the key is already in flight the caller waits for it
    /// instead of starting another one. Failed fetches are reported to every
    /// waiter and leave the entry stale.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn read<F, Fut>(&self, key: K, fetcher: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let fetch = {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);

            if !entry.is_stale(&key, Instant::now())
                && let Some(data) = &entry.data
            {
                tracing::trace!(target: TRACING_TARGET_CACHE, key = ?key, "Cache hit");
                return Ok(data.clone());
            }

            match &entry.in_flight {
                Some((_, fetch)) => {
                    tracing::trace!(target: TRACING_TARGET_CACHE, key = ?key, "Joining in-flight fetch");
                    fetch.clone()
                }
                None => {
                    let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.spawn_fetch(key.clone(), fetch_id, fetcher);

                    tracing::debug!(target: TRACING_TARGET_CACHE, key = ?key, fetch_id, "Fetching query");
                    entry.status = EntryStatus::Loading;
                    entry.invalidated = false;
                    entry.in_flight = Some((fetch_id, fetch.clone()));
                    fetch
                }
            }
        };

        fetch.await
    }

    fn spawn_fetch<F, Fut>(&self, key: K, fetch_id: u64, fetcher: F) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let inner: Weak<Inner<K, V>> = Arc::downgrade(&self.inner);
        let task = tokio::spawn({
            let inner = inner.clone();
            let key = key.clone();
            async move {
                let result = fetcher().await;
                if let Some(inner) = inner.upgrade() {
                    inner.complete(&key, fetch_id, &result);
                }
                result
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    // A panicked or aborted fetch never reached `complete`.
                    let result = Err(Error::data_access()
                        .with_message("query fetch task did not complete")
                        .with_source(join_error));
                    if let Some(inner) = inner.upgrade() {
                        inner.complete(&key, fetch_id, &result);
                    }
                    result
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Marks every entry whose key matches `predicate` as stale.
    ///
    /// Entries with a fetch in flight keep that fetch; its result is stored but
    /// stays stale. Keys without an entry are unaffected. Returns the number of
    /// entries marked.
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let invalidated: Vec<K> = {
            let mut entries = self.inner.lock();
            entries
                .iter_mut()
                .filter(|(key, _)| predicate(key))
                .map(|(key, entry)| {
                    entry.invalidated = true;
                    key.clone()
                })
                .collect()
        };

        if !invalidated.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_CACHE,
                keys = ?invalidated,
                "Invalidated queries"
            );
        }

        let count = invalidated.len();
        for key in invalidated {
            self.inner.notify(CacheEvent::Invalidated(key));
        }

        count
    }

    /// Marks a single key as stale. Returns whether an entry existed.
    pub fn invalidate_key(&self, key: &K) -> bool {
        self.invalidate(|candidate| candidate == key) > 0
    }

    /// Returns a snapshot of the entry for `key` without fetching.
    pub fn peek(&self, key: &K) -> Option<EntrySnapshot<V>> {
        let entries = self.inner.lock();
        entries
            .get(key)
            .map(|entry| entry.snapshot(key, Instant::now()))
    }

    /// Removes the entry for `key`. A fetch in flight for it completes without being stored.
    pub fn remove(&self, key: &K) -> bool {
        let removed = self.inner.lock().remove(key).is_some();
        if removed {
            self.inner.notify(CacheEvent::Removed(key.clone()));
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let keys: Vec<K> = self.inner.lock().drain().map(|(key, _)| key).collect();
        for key in keys {
            self.inner.notify(CacheEvent::Removed(key));
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent<K>> {
        self.inner.events.subscribe()
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: QueryKey,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for QueryCache<K, V>
where
    K: QueryKey,
    V: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::ErrorKind;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestKey {
        Fresh(u32),
        Always(u32),
    }

    impl QueryKey for TestKey {
        fn stale_time(&self) -> Duration {
            match self {
                TestKey::Fresh(_) => Duration::from_secs(10),
                TestKey::Always(_) => Duration::ZERO,
            }
        }
    }

    fn counting_fetcher(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_served_without_fetch() {
        let cache = QueryCache::<TestKey, u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 7)).await.unwrap(), 7);
        assert_eq!(cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 8)).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_refetches_after_stale_time() {
        let cache = QueryCache::<TestKey, u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 2)).await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 3)).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_stale_time_always_refetches() {
        let cache = QueryCache::<TestKey, u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.read(TestKey::Always(1), counting_fetcher(&calls, 1)).await.unwrap();
        cache.read(TestKey::Always(1), counting_fetcher(&calls, 2)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = QueryCache::<TestKey, u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let reads = (0..8).map(|_| {
            let calls = Arc::clone(&calls);
            cache.read(TestKey::Always(1), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(5)
            })
        });

        let results = futures::future::join_all(reads).await;
        assert!(results.iter().all(|result| matches!(result, Ok(5))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidating_missing_key_is_noop() {
        let cache = QueryCache::<TestKey, u32>::new();

        assert_eq!(cache.invalidate(|key| *key == TestKey::Fresh(9)), 0);
        assert!(cache.peek(&TestKey::Fresh(9)).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let cache = QueryCache::<TestKey, u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 1)).await.unwrap();
        cache.read(TestKey::Fresh(2), counting_fetcher(&calls, 2)).await.unwrap();

        let marked = cache.invalidate(|key| matches!(key, TestKey::Fresh(1)));
        assert_eq!(marked, 1);
        assert!(cache.peek(&TestKey::Fresh(1)).unwrap().is_stale);
        assert!(!cache.peek(&TestKey::Fresh(2)).unwrap().is_stale);

        assert_eq!(cache.read(TestKey::Fresh(1), counting_fetcher(&calls, 10)).await.unwrap(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_during_fetch_leaves_result_stale() {
        let cache = QueryCache::<TestKey, u32>::new();
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .read(TestKey::Fresh(1), move || async move {
                        let _ = wait.await;
                        Ok(1)
                    })
                    .await
            }
        });

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert!(cache.peek(&TestKey::Fresh(1)).unwrap().is_fetching);
        assert_eq!(cache.invalidate(|_| true), 1);

        release.send(()).unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), 1);

        let snapshot = cache.peek(&TestKey::Fresh(1)).unwrap();
        assert_eq!(snapshot.status, EntryStatus::Success);
        assert_eq!(snapshot.data, Some(1));
        assert!(snapshot.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_not_cached() {
        let cache = QueryCache::<TestKey, u32>::new();

        let failed = cache
            .read(TestKey::Fresh(1), || async {
                Err(Error::data_access().with_message("offline"))
            })
            .await;
        assert_eq!(failed.unwrap_err().kind(), ErrorKind::DataAccess);

        let snapshot = cache.peek(&TestKey::Fresh(1)).unwrap();
        assert_eq!(snapshot.status, EntryStatus::Error);
        assert!(snapshot.is_stale);

        let value = cache.read(TestKey::Fresh(1), || async { Ok(3) }).await;
        assert_eq!(value.unwrap(), 3);
    }

    async fn exploding_fetch() -> Result<u32> {
        panic!("fetch exploded")
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_does_not_poison_key() {
        let cache = QueryCache::<TestKey, u32>::new();

        let error = cache
            .read(TestKey::Fresh(1), exploding_fetch)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DataAccess);

        let snapshot = cache.peek(&TestKey::Fresh(1)).unwrap();
        assert_eq!(snapshot.status, EntryStatus::Error);
        assert!(!snapshot.is_fetching);

        let value = cache.read(TestKey::Fresh(1), || async { Ok(2) }).await.unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_emitted() {
        let cache = QueryCache::<TestKey, u32>::new();
        let mut events = cache.subscribe();

        cache.read(TestKey::Fresh(1), || async { Ok(1) }).await.unwrap();
        cache.invalidate_key(&TestKey::Fresh(1));
        cache.remove(&TestKey::Fresh(1));

        assert_eq!(events.recv().await.unwrap(), CacheEvent::Updated(TestKey::Fresh(1)));
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Invalidated(TestKey::Fresh(1)));
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Removed(TestKey::Fresh(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_clear() {
        let cache = QueryCache::<TestKey, u32>::new();
        cache.read(TestKey::Fresh(1), || async { Ok(1) }).await.unwrap();
        cache.read(TestKey::Fresh(2), || async { Ok(2) }).await.unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.remove(&TestKey::Fresh(1)));
        assert!(!cache.remove(&TestKey::Fresh(1)));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
