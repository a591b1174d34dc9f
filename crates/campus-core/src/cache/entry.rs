use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use super::CacheError;

/// A fetch that every caller for the same key awaits together.
pub(crate) type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, CacheError>>>;

/// One slot in the cache.
///
/// Holds either a pending fetch or, once it settles, the resolved value.
/// A refetch replaces the whole slot. `generation` identifies the fetch that
/// created the slot so a late result cannot land in a slot created after a
/// `clear`.
pub(crate) struct CacheEntry<V> {
    pub value: Option<V>,
    pub fetched_at: Instant,
    pub pending: Option<SharedFetch<V>>,
    pub generation: u64,
}

impl<V: Clone> CacheEntry<V> {
    pub fn pending(fetch: SharedFetch<V>, generation: u64) -> Self {
        Self {
            value: None,
            fetched_at: Instant::now(),
            pending: Some(fetch),
            generation,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// The cached value, if one exists and is younger than `ttl`.
    pub fn fresh_value(&self, now: Instant, ttl: Duration) -> Option<&V> {
        self.value.as_ref().filter(|_| self.age(now) < ttl)
    }

    /// Whether a sweep may drop this entry. Entries with a fetch in flight
    /// are kept so their waiters still coalesce.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.pending.is_none() && self.age(now) > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn settled(value: u32) -> CacheEntry<u32> {
        CacheEntry {
            value: Some(value),
            fetched_at: Instant::now(),
            pending: None,
            generation: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_respects_ttl() {
        let entry = settled(5);
        let ttl = Duration::from_secs(30);
        assert_eq!(entry.fresh_value(Instant::now(), ttl), Some(&5));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(entry.fresh_value(Instant::now(), ttl), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_entries_never_expire() {
        let fetch: SharedFetch<u32> = async { Ok(1) }.boxed().shared();
        let entry = CacheEntry::pending(fetch, 1);
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(!entry.is_expired(Instant::now(), Duration::from_secs(30)));
        assert!(entry.fresh_value(Instant::now(), Duration::from_secs(30)).is_none());
    }
}
