//! Memoized backend queries.
//!
//! Key-value enumeration, filter lookups and pulse fetches are repeated
//! heavily while recommendations are recomputed. Each gets its own bounded
//! cache keyed by its canonicalized arguments.

use std::sync::Arc;

use async_trait::async_trait;
use terastore_cache::{cache_key, CacheStats, Memoized};
use terastore_core::{AttrKey, AttrValue, FilterResult, Pulse, PulseFilter, PulseId, PulseMetadata};
use tracing::debug;

use crate::api::TeraStoreClient;
use crate::error::ClientError;
use crate::http::HttpClient;
use crate::index::PulseIndex;

/// Per-function cache sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheCapacities {
    pub key_values: usize,
    pub filter: usize,
    pub pulses: usize,
}

impl Default for CacheCapacities {
    fn default() -> Self {
        Self {
            key_values: 15,
            filter: 100,
            pulses: 50,
        }
    }
}

/// Client wrapper that memoizes read queries.
pub struct CachedQueries<T: HttpClient> {
    client: Arc<TeraStoreClient<T>>,
    key_values: Memoized<Vec<AttrValue>>,
    filters: Memoized<Arc<Vec<PulseMetadata>>>,
    pulses: Memoized<Vec<Pulse>>,
}

impl<T: HttpClient> CachedQueries<T> {
    pub fn new(client: Arc<TeraStoreClient<T>>, capacities: CacheCapacities) -> Self {
        Self {
            client,
            key_values: Memoized::new("key_values", capacities.key_values),
            filters: Memoized::new("filter", capacities.filter),
            pulses: Memoized::new("pulses", capacities.pulses),
        }
    }

    pub fn client(&self) -> &Arc<TeraStoreClient<T>> {
        &self.client
    }

    pub async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError> {
        let cache_key = cache_key("key_values", [key.name(), key.kind().as_str()]);
        self.key_values
            .get_or_fetch(&cache_key, || TeraStoreClient::key_values(&self.client, key))
            .await
    }

    /// Filter lookup cached by filter-set content, independent of order.
    pub async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError> {
        let mut identities: Vec<[String; 4]> = filters.iter().map(PulseFilter::identity_parts).collect();
        identities.sort();
        let cache_key = cache_key("filter", identities.iter().flatten());

        let matches = self
            .filters
            .get_or_fetch(&cache_key, || async {
                let result = TeraStoreClient::filter_pulses(&self.client, filters).await?;
                Ok::<_, ClientError>(Arc::new(result.matches))
            })
            .await?;

        Ok(FilterResult::new(filters.to_vec(), matches.as_ref().clone()))
    }

    /// Pulse fetch cached by the set of requested ids.
    pub async fn get_pulses(&self, ids: &[PulseId]) -> Result<Vec<Pulse>, ClientError> {
        let mut sorted: Vec<&str> = ids.iter().map(PulseId::as_str).collect();
        sorted.sort_unstable();
        let cache_key = cache_key("pulses", &sorted);

        self.pulses
            .get_or_fetch(&cache_key, || self.client.get_pulses(ids))
            .await
    }

    pub fn stats(&self) -> Vec<(&'static str, CacheStats)> {
        vec![
            (self.key_values.name(), self.key_values.stats()),
            (self.filters.name(), self.filters.stats()),
            (self.pulses.name(), self.pulses.stats()),
        ]
    }

    /// Drop all cached results, e.g. after an upload changed the data.
    pub fn clear(&self) {
        self.key_values.clear();
        self.filters.clear();
        self.pulses.clear();
        debug!("Cleared query caches");
    }
}

#[async_trait]
impl<T: HttpClient> PulseIndex for CachedQueries<T> {
    async fn list_keys(&self) -> Result<Vec<AttrKey>, ClientError> {
        TeraStoreClient::list_keys(&self.client).await
    }

    async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError> {
        CachedQueries::key_values(self, key).await
    }

    async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError> {
        CachedQueries::filter_pulses(self, filters).await
    }
}
