//! Content-derived cache keys.
//!
//! Keys are blake3 digests over a namespace and the call arguments, so two
//! calls with semantically equal arguments share an entry regardless of how
//! the caller allocated them. Callers canonicalize argument order first.

/// Incremental builder for a cache key.
pub struct CacheKeyBuilder {
    hasher: blake3::Hasher,
}

impl CacheKeyBuilder {
    pub fn new(namespace: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(namespace.as_bytes());
        hasher.update(&[0]);
        Self { hasher }
    }

    /// Append one argument. Parts are length-prefixed so `["ab", "c"]` and
    /// `["a", "bc"]` differ.
    pub fn part(mut self, part: &str) -> Self {
        self.hasher.update(&(part.len() as u64).to_le_bytes());
        self.hasher.update(part.as_bytes());
        self
    }

    pub fn parts<I, S>(self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parts.into_iter().fold(self, |builder, p| builder.part(p.as_ref()))
    }

    pub fn finish(self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

/// Key for `namespace` called with `parts`, in the given order.
pub fn cache_key<I, S>(namespace: &str, parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CacheKeyBuilder::new(namespace).parts(parts).finish()
}
