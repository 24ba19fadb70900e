//! Fixed-capacity least-recently-used map keyed by cache key strings.

use std::num::NonZeroUsize;

/// LRU map with string keys.
///
/// `get` counts as a use and promotes the entry. Not synchronized; wrap it
/// in a mutex to share it.
pub struct LruCache<V> {
    inner: lru::LruCache<String, V>,
}

impl<V> LruCache<V> {
    /// Create a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: lru::LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&V> {
        self.inner.get(key)
    }

    /// Look up without touching recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.inner.peek(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    /// Insert or replace `key` as the most recent entry.
    ///
    /// Returns the entry evicted to make room, if any. Replacing an existing
    /// key never evicts.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<(String, V)> {
        let key = key.into();
        if let Some(slot) = self.inner.get_mut(&key) {
            *slot = value;
            return None;
        }
        self.inner.push(key, value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|(k, _)| k.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        assert!(cache.set("a", 1).is_none());
        assert!(cache.set("b", 2).is_none());

        // Touch "a" so "b" becomes the eviction victim.
        assert_eq!(cache.get("a"), Some(&1));
        let evicted = cache.set("c", 3);

        assert_eq!(evicted, Some(("b".to_string(), 2)));
        assert!(cache.contains("a"));
        assert!(cache.contains("c"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replace_promotes_without_evicting() {
        let mut cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert!(cache.set("a", 10).is_none());
        assert_eq!(cache.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.peek("a"), Some(&10));

        let evicted = cache.set("c", 3);
        assert_eq!(evicted, Some(("b".to_string(), 2)));
    }

    #[test]
    fn peek_does_not_promote() {
        let mut cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        let evicted = cache.set("c", 3);
        assert_eq!(evicted.map(|(k, _)| k), Some("a".to_string()));
    }

    #[test]
    fn zero_capacity_holds_one_entry() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = LruCache::new(15);
        for i in 0..100 {
            cache.set(format!("k{}", i), i);
            assert!(cache.len() <= 15);
        }
        cache.clear();
        assert!(cache.is_empty());
    }
}
