//! Async memoization over an [`LruCache`] with single-flight misses.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::lru::LruCache;

/// Counters for one memoized function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Memoizes an async fetch per cache key.
///
/// Settled values are kept in a bounded LRU. While a fetch for a key is
/// running, further callers for the same key await it instead of starting
/// their own. Failed fetches are not stored; the next caller retries.
pub struct Memoized<V> {
    name: &'static str,
    cache: Mutex<LruCache<V>>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Memoized<V> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            cache: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cached = self.cache.lock().get(key).cloned();
        if let Some(value) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, key, "Cache hit");
            return Ok(value);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_try_init(|| async {
                // A fetch for this key may have settled since the lookup above.
                let settled = self.cache.lock().get(key).cloned();
                if let Some(value) = settled {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }

                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(cache = self.name, key, "Cache miss, fetching");
                let value = fetch().await?;
                let evicted = self.cache.lock().set(key, value.clone());
                if let Some((evicted, _)) = evicted {
                    debug!(cache = self.name, evicted = %evicted, "Evicted cache entry");
                }
                Ok(value)
            })
            .await
            .cloned();

        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
            in_flight.remove(key);
        }

        result
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: cache.len(),
            capacity: cache.capacity(),
        }
    }

    /// Number of keys with a fetch currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn hit_skips_fetch() {
        let memo = Memoized::new("test", 4);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: Result<u32, ()> = memo
                .get_or_fetch("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value, Ok(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = memo.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let memo: Memoized<u32> = Memoized::new("test", 4);

        let first: Result<u32, &str> = memo.get_or_fetch("k", || async { Err("boom") }).await;
        assert_eq!(first, Err("boom"));
        assert_eq!(memo.stats().entries, 0);

        let second: Result<u32, &str> = memo.get_or_fetch("k", || async { Ok(1) }).await;
        assert_eq!(second, Ok(1));
        assert_eq!(memo.in_flight(), 0);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let memo: Memoized<u32> = Memoized::new("test", 4);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ()>(42)
        };

        let (a, b) = tokio::join!(memo.get_or_fetch("k", fetch), memo.get_or_fetch("k", fetch));

        assert_eq!(a, Ok(42));
        assert_eq!(b, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.in_flight(), 0);
    }

    #[tokio::test]
    async fn different_keys_fetch_independently() {
        let memo: Memoized<String> = Memoized::new("test", 1);

        let a: Result<_, ()> = memo.get_or_fetch("a", || async { Ok("A".to_string()) }).await;
        let b: Result<_, ()> = memo.get_or_fetch("b", || async { Ok("B".to_string()) }).await;
        assert_eq!(a.unwrap(), "A");
        assert_eq!(b.unwrap(), "B");

        // Capacity one: "a" was evicted by "b".
        let again: Result<_, ()> = memo.get_or_fetch("a", || async { Ok("A2".to_string()) }).await;
        assert_eq!(again.unwrap(), "A2");
        assert_eq!(memo.stats().misses, 3);

        memo.clear();
        assert_eq!(memo.stats().entries, 0);
    }
}
