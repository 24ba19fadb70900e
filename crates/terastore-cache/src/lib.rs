// terastore-cache - Client-side request cache
//
// A bounded LRU map, a content-derived cache key, and an async memoizer that
// collapses concurrent misses on the same key into a single fetch.

pub mod key;
pub mod lru;
pub mod memoize;

pub use key::{cache_key, CacheKeyBuilder};
pub use lru::LruCache;
pub use memoize::{CacheStats, Memoized};
