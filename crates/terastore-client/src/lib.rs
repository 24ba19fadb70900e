//! TeraStore REST client
//!
//! [`TeraStoreClient`] speaks the backend's HTTP API through an [`HttpClient`]
//! transport. Authentication state lives in an explicit [`Session`] shared by
//! whoever needs it. [`CachedQueries`] memoizes the calls the filter engine
//! repeats most, and both implement [`PulseIndex`], the read-only view the
//! engine is written against.

pub mod api;
pub mod auth;
pub mod cached;
pub mod error;
pub mod http;
pub mod index;
pub mod protocol;
pub mod routes;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::TeraStoreClient;
pub use cached::{CacheCapacities, CachedQueries};
pub use error::ClientError;
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use index::PulseIndex;
pub use session::{Claims, Session};
