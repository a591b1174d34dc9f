use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::entry::{CacheEntry, SharedFetch};

/// How long a fetched value is served without refetching.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// How often the background sweeper drops stale entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Failure of a cached fetch, shared by every caller that awaited it.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("{0:#}")]
    Fetch(Arc<anyhow::Error>),

    #[error("fetch for {key} did not complete: {reason}")]
    Aborted { key: String, reason: String },
}

impl CacheError {
    /// Whether both errors come from the same failed fetch.
    pub fn is_same_failure(&self, other: &CacheError) -> bool {
        match (self, other) {
            (CacheError::Fetch(a), CacheError::Fetch(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

struct Inner<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    next_generation: AtomicU64,
}

impl<V: Clone> Inner<V> {
    // The map is only touched between suspension points, so a poisoned lock
    // still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the outcome of the fetch identified by `generation`.
    ///
    /// If the entry was cleared (or replaced) while the fetch was in flight
    /// the outcome is dropped rather than resurrecting the key.
    fn settle(&self, key: &str, generation: u64, result: &Result<V, CacheError>) {
        let mut entries = self.lock();
        let current = entries.get(key).map(|entry| entry.generation);
        if current != Some(generation) {
            debug!(key = key, "Entry cleared while fetch was in flight, discarding result");
            return;
        }

        match result {
            Ok(value) => {
                if let Some(entry) = entries.get_mut(key) {
                    entry.value = Some(value.clone());
                    entry.fetched_at = Instant::now();
                    entry.pending = None;
                }
            }
            Err(e) => {
                entries.remove(key);
                debug!(key = key, error = %e, "Fetch failed, entry discarded");
            }
        }
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        before - entries.len()
    }
}

/// Keyed cache of asynchronously fetched values.
///
/// `get` returns a fresh cached value, joins a fetch already in flight for
/// the key, or starts a new one. At most one fetch per key is outstanding at
/// any time. Fetches run as their own tasks, so a fetch always completes
/// (and is recorded) even if every caller stops waiting.
///
/// Clone is cheap; clones share the same entries.
pub struct ResourceCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for ResourceCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Default for ResourceCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

enum Lookup<V> {
    Hit(V),
    InFlight(SharedFetch<V>),
}

impl<V: Clone + Send + Sync + 'static> ResourceCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                ttl,
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Get the value for `key`, calling `fetcher` only when there is neither
    /// a fresh value nor a fetch in flight.
    ///
    /// A failed fetch leaves no entry behind and its error is handed to every
    /// caller that was waiting on it.
    pub async fn get<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let fetch = {
            let mut entries = self.inner.lock();
            let now = Instant::now();

            let lookup = entries.get(key).and_then(|entry| {
                if let Some(value) = entry.fresh_value(now, self.inner.ttl) {
                    return Some(Lookup::Hit(value.clone()));
                }
                entry.pending.clone().map(Lookup::InFlight)
            });

            match lookup {
                Some(Lookup::Hit(value)) => {
                    debug!(key = key, "Cache hit");
                    return Ok(value);
                }
                Some(Lookup::InFlight(fetch)) => {
                    debug!(key = key, "Joining in-flight fetch");
                    fetch
                }
                None => self.start_fetch(&mut entries, key, fetcher),
            }
        };

        fetch.await
    }

    /// Spawn the fetch and register it as pending. Must be called with the
    /// entry map locked so no second fetch can start for `key` meanwhile.
    fn start_fetch<F, Fut, E>(
        &self,
        entries: &mut HashMap<String, CacheEntry<V>>,
        key: &str,
        fetcher: F,
    ) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        info!(key = key, "Cache miss, fetching");

        let future = fetcher();
        let task_inner = Arc::clone(&self.inner);
        let task_key = key.to_string();
        let handle = tokio::spawn(async move {
            let result = future
                .await
                .map_err(|e| CacheError::Fetch(Arc::new(e.into())));
            task_inner.settle(&task_key, generation, &result);
            result
        });

        let join_inner = Arc::clone(&self.inner);
        let join_key = key.to_string();
        let fetch = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let err = CacheError::Aborted {
                        key: join_key.clone(),
                        reason: e.to_string(),
                    };
                    join_inner.settle(&join_key, generation, &Err(err.clone()));
                    Err(err)
                }
            }
        }
        .boxed()
        .shared();

        entries.insert(key.to_string(), CacheEntry::pending(fetch.clone(), generation));
        fetch
    }

    /// Drop the entry for `key` so the next `get` refetches.
    pub fn clear(&self, key: &str) {
        if self.inner.lock().remove(key).is_some() {
            debug!(key = key, "Cache entry cleared");
        }
    }

    /// Drop every entry.
    pub fn clear_all(&self) {
        self.inner.lock().clear();
        debug!("Cache cleared");
    }

    /// Remove settled entries older than the TTL. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn a background task that sweeps every `interval`.
    ///
    /// The task holds only a weak reference and exits once every clone of
    /// the cache is dropped; abort the handle to stop it earlier.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner<V>> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            debug!(interval_secs = interval.as_secs(), "Starting cache sweeper");

            loop {
                tokio::time::sleep(interval).await;

                let Some(inner) = weak.upgrade() else {
                    debug!("Cache dropped, sweeper exiting");
                    break;
                };

                let removed = inner.sweep();
                if removed > 0 {
                    info!(removed = removed, "Cache sweep removed stale entries");
                } else {
                    debug!("Cache sweep: no stale entries");
                }
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use anyhow::anyhow;
    use futures::future::{join_all, BoxFuture};
    use tokio::sync::Notify;

    type Fetcher = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<u32>> + Send>;

    /// Fetcher that counts invocations and resolves to `value`.
    fn counting(calls: &Arc<AtomicUsize>, value: u32) -> Fetcher {
        let calls = Arc::clone(calls);
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        })
    }

    /// Fetcher that counts invocations and waits for `gate` before resolving.
    fn gated(calls: &Arc<AtomicUsize>, gate: &Arc<Notify>, result: Result<u32, &'static str>) -> Fetcher {
        let calls = Arc::clone(calls);
        let gate = Arc::clone(gate);
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                gate.notified().await;
                result.map_err(|msg| anyhow!(msg))
            }
            .boxed()
        })
    }

    async fn settle_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_second_get_within_ttl_is_a_hit() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("events", counting(&calls, 1)).await.unwrap(), 1);
        assert_eq!(cache.get("events", counting(&calls, 2)).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_timeline() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(cache.get("events", counting(&calls, 10)).await.unwrap(), 10);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get("events", counting(&calls, 20)).await.unwrap(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(21)).await;
        assert_eq!(cache.get("events", counting(&calls, 30)).await.unwrap(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get("events", counting(&calls, 1)).await.unwrap();
        cache.get("notices", counting(&calls, 2)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_fetch() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let gets = (0..5).map(|_| cache.get("events", gated(&calls, &gate, Ok(7))));
        let (results, _) = tokio::join!(join_all(gets), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| matches!(r, Ok(7))));
    }

    #[tokio::test]
    async fn test_concurrent_failure_reaches_every_waiter() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let gets = (0..3).map(|_| cache.get("users", gated(&calls, &gate, Err("backend down"))));
        let (results, _) = tokio::join!(join_all(gets), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let errors: Vec<CacheError> = results.into_iter().map(|r| r.unwrap_err()).collect();
        assert!(errors.iter().all(|e| e.is_same_failure(&errors[0])));
        assert_eq!(errors[0].to_string(), "backend down");
        assert!(!cache.contains_key("users"));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache: ResourceCache<u32> = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(anyhow!("connection refused")) }
            }
        };
        assert!(cache.get("notices", failing).await.is_err());
        assert!(!cache.contains_key("notices"));

        assert_eq!(cache.get("notices", counting(&calls, 4)).await.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_during_fetch_does_not_resurrect_entry() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let (result, _) = tokio::join!(cache.get("events", gated(&calls, &gate, Ok(1))), async {
            tokio::task::yield_now().await;
            cache.clear("events");
            gate.notify_one();
        });

        // The waiter still gets its value, but the cache does not keep it.
        assert_eq!(result.unwrap(), 1);
        assert!(!cache.contains_key("events"));
    }

    #[tokio::test]
    async fn test_failure_after_clear_still_propagates() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let (result, _) = tokio::join!(cache.get("events", gated(&calls, &gate, Err("timeout"))), async {
            tokio::task::yield_now().await;
            cache.clear_all();
            gate.notify_one();
        });

        assert_eq!(result.unwrap_err().to_string(), "timeout");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_completes_after_caller_gives_up() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let caller = {
            let cache = cache.clone();
            let fetcher = gated(&calls, &gate, Ok(9));
            tokio::spawn(async move { cache.get("users", fetcher).await })
        };
        while !cache.contains_key("users") {
            tokio::task::yield_now().await;
        }
        caller.abort();
        gate.notify_one();

        let value = cache.get("users", counting(&calls, 0)).await.unwrap();
        assert_eq!(value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get("events", counting(&calls, 1)).await.unwrap();
        cache.get("notices", counting(&calls, 2)).await.unwrap();

        cache.clear_all();
        assert!(cache.is_empty());

        cache.get("events", counting(&calls, 3)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_stale_entries() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get("events", counting(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;
        cache.get("notices", counting(&calls, 2)).await.unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;

        assert_eq!(cache.sweep(), 1);
        assert!(!cache.contains_key("events"));
        assert!(cache.contains_key("notices"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_in_flight_fetch() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let (result, _) = tokio::join!(cache.get("events", gated(&calls, &gate, Ok(5))), async {
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_secs(45)).await;
            assert_eq!(cache.sweep(), 0);
            gate.notify_one();
        });

        assert_eq!(result.unwrap(), 5);
        assert!(cache.contains_key("events"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_runs_periodically() {
        let cache = ResourceCache::new(DEFAULT_TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get("events", counting(&calls, 1)).await.unwrap();

        let handle = cache.spawn_sweeper(DEFAULT_SWEEP_INTERVAL);
        settle_tasks().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        settle_tasks().await;

        assert!(cache.is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_cache_dropped() {
        let cache: ResourceCache<u32> = ResourceCache::new(DEFAULT_TTL);
        let handle = cache.spawn_sweeper(Duration::from_secs(1));
        settle_tasks().await;
        drop(cache);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle_tasks().await;
        assert!(handle.is_finished());
    }
}
