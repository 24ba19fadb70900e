//! Read-only view of the pulse store used by the filter engine.

use std::sync::Arc;

use async_trait::async_trait;
use terastore_core::{AttrKey, AttrValue, FilterResult, PulseFilter};

use crate::api::TeraStoreClient;
use crate::error::ClientError;
use crate::http::HttpClient;

#[async_trait]
pub trait PulseIndex: Send + Sync {
    /// Attribute keys reported by the backend (without the synthetic date key).
    async fn list_keys(&self) -> Result<Vec<AttrKey>, ClientError>;

    /// Distinct values stored under `key`.
    async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError>;

    /// Pulses matching all of `filters`.
    async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError>;
}

#[async_trait]
impl<T: HttpClient> PulseIndex for TeraStoreClient<T> {
    async fn list_keys(&self) -> Result<Vec<AttrKey>, ClientError> {
        TeraStoreClient::list_keys(self).await
    }

    async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError> {
        TeraStoreClient::key_values(self, key).await
    }

    async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError> {
        TeraStoreClient::filter_pulses(self, filters).await
    }
}

#[async_trait]
impl<I: PulseIndex + ?Sized> PulseIndex for Arc<I> {
    async fn list_keys(&self) -> Result<Vec<AttrKey>, ClientError> {
        (**self).list_keys().await
    }

    async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError> {
        (**self).key_values(key).await
    }

    async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError> {
        (**self).filter_pulses(filters).await
    }
}
