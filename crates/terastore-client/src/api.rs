//! TeraStore REST client
//!
//! Pulse, attribute and device endpoints. Authentication endpoints live in
//! [`crate::auth`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use terastore_core::{
    parse_timestamp, AnnotatedPulse, AttrKey, AttrValue, Device, FilterResult, Pulse, PulseCreate, PulseFilter,
    PulseId, PulseMetadata,
};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ClientError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::protocol::{DeviceCreate, ErrorResponse, FilterRequest, FilterRow, KeyEntry};
use crate::routes;
use crate::session::Session;

pub(crate) const JSON: &str = "application/json";
pub(crate) const FORM: &str = "application/x-www-form-urlencoded";

/// Request body with its content type.
pub(crate) struct Body {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Whether a request carries the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Bearer,
    Anonymous,
}

/// TeraStore backend client
///
/// Generic over the transport so tests can substitute a mock.
pub struct TeraStoreClient<T: HttpClient> {
    http: T,
    base_url: Url,
    session: Arc<Session>,
    // Serializes lazy refreshes; `true` once one failed.
    refresh_failed: Mutex<bool>,
}

impl<T: HttpClient> TeraStoreClient<T> {
    pub fn new(http: T, base_url: &str, session: Arc<Session>) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed,
            session,
            refresh_failed: Mutex::new(false),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn http(&self) -> &T {
        &self.http
    }

    /// List attribute keys known to the backend.
    ///
    /// Calls: GET /attrs/keys
    #[instrument(skip(self))]
    pub async fn list_keys(&self) -> Result<Vec<AttrKey>, ClientError> {
        let entries: Vec<KeyEntry> = self.get_json(routes::ATTR_KEYS).await?;
        let keys = entries
            .into_iter()
            .map(KeyEntry::into_key)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = keys.len(), "Loaded attribute keys");
        Ok(keys)
    }

    /// Enumerate the distinct values stored under `key`.
    ///
    /// Calls: GET /attrs/{key}/values
    #[instrument(skip(self), fields(key = %key))]
    pub async fn key_values(&self, key: &AttrKey) -> Result<Vec<AttrValue>, ClientError> {
        self.get_json(&routes::key_values(key.name())).await
    }

    /// Pulses matching every filter in `filters`.
    ///
    /// The request body lists filters in canonical order; the returned
    /// result keeps the caller's order.
    ///
    /// Calls: POST /attrs/filter
    #[instrument(skip(self, filters), fields(filters = filters.len()))]
    pub async fn filter_pulses(&self, filters: &[PulseFilter]) -> Result<FilterResult, ClientError> {
        let path = routes::display_path(routes::ATTR_FILTER);
        let rows: Vec<FilterRow> = self.post_json(routes::ATTR_FILTER, &FilterRequest::new(filters)).await?;

        let matches = rows
            .into_iter()
            .map(|FilterRow(pulse_id, creation_time)| {
                let creation_time = parse_timestamp(&creation_time).ok_or_else(|| ClientError::Decode {
                    path: path.clone(),
                    message: format!("invalid creation_time '{}' for pulse {}", creation_time, pulse_id),
                })?;
                Ok(PulseMetadata {
                    pulse_id,
                    creation_time,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        debug!(matches = matches.len(), "Filtered pulses");
        Ok(FilterResult::new(filters.to_vec(), matches))
    }

    /// Calls: GET /pulses/{id}
    #[instrument(skip(self), fields(pulse_id = %id))]
    pub async fn get_pulse(&self, id: &PulseId) -> Result<Pulse, ClientError> {
        self.get_json(&routes::pulse(id.as_str())).await
    }

    /// Calls: POST /pulses/get
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn get_pulses(&self, ids: &[PulseId]) -> Result<Vec<Pulse>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.post_json(routes::PULSES_GET, &ids).await
    }

    /// Store validated pulses and return their new ids.
    ///
    /// Calls: POST /pulses/create
    #[instrument(skip(self, pulses), fields(pulses = pulses.len()))]
    pub async fn create_pulses(&self, pulses: &[AnnotatedPulse]) -> Result<Vec<PulseId>, ClientError> {
        if pulses.is_empty() {
            return Ok(Vec::new());
        }
        let body: Vec<PulseCreate> = pulses.iter().map(AnnotatedPulse::to_backend).collect();
        let ids: Vec<PulseId> = self.post_json(routes::PULSES_CREATE, &body).await?;
        debug!(created = ids.len(), "Created pulses");
        Ok(ids)
    }

    /// Calls: GET /devices
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> Result<Vec<Device>, ClientError> {
        self.get_json(routes::DEVICES).await
    }

    /// Register a device by serial number.
    ///
    /// Calls: POST /devices
    #[instrument(skip(self))]
    pub async fn add_device(&self, serial_number: &str) -> Result<(), ClientError> {
        let body = json_body(routes::DEVICES, &DeviceCreate { serial_number })?;
        self.execute("POST", routes::DEVICES, Some(body), Auth::Bearer).await?;
        Ok(())
    }

    /// Calls: GET /health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String, ClientError> {
        let response = self.execute("GET", routes::HEALTH, None, Auth::Anonymous).await?;
        Ok(response.text())
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, segments: &[&str]) -> Result<R, ClientError> {
        let response = self.execute("GET", segments, None, Auth::Bearer).await?;
        decode(segments, &response)
    }

    pub(crate) async fn post_json<B, R>(&self, segments: &[&str], body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = json_body(segments, body)?;
        let response = self.execute("POST", segments, Some(body), Auth::Bearer).await?;
        decode(segments, &response)
    }

    /// Send one request, attaching the bearer token when `auth` asks for it.
    pub(crate) async fn execute(
        &self,
        method: &str,
        segments: &[&str],
        body: Option<Body>,
        auth: Auth,
    ) -> Result<HttpResponse, ClientError> {
        let mut headers = Vec::new();
        if auth == Auth::Bearer {
            if let Some(token) = self.bearer_token().await {
                headers.push(bearer_header(&token));
            }
        }
        self.send(method, segments, headers, body).await
    }

    /// Single round trip with the given extra headers. Non-2xx responses
    /// become [`ClientError::Status`].
    pub(crate) async fn send(
        &self,
        method: &str,
        segments: &[&str],
        mut headers: Vec<(String, String)>,
        body: Option<Body>,
    ) -> Result<HttpResponse, ClientError> {
        let path = routes::display_path(segments);

        headers.push(("Accept".to_string(), JSON.to_string()));
        let body = body.map(|b| {
            headers.push(("Content-Type".to_string(), b.content_type.to_string()));
            b.bytes
        });
        let request = HttpRequest {
            method: method.to_string(),
            url: routes::endpoint(&self.base_url, segments).into(),
            headers,
            body,
        };

        debug!(method, path = %path, "Sending request");
        let response = self
            .http
            .send(request)
            .await
            .map_err(|source| ClientError::Transport {
                path: path.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(status_error(path, &response));
        }
        Ok(response)
    }

    /// Current token, refreshing it first when the session has none.
    ///
    /// Concurrent callers share one refresh. After a failed refresh later
    /// requests go out unauthenticated without retrying it.
    async fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self.session.token() {
            return Some(token);
        }

        let mut failed = self.refresh_failed.lock().await;
        if let Some(token) = self.session.token() {
            return Some(token);
        }
        if *failed {
            return None;
        }
        match self.refresh().await {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, "Token refresh failed, sending requests unauthenticated");
                *failed = true;
                None
            }
        }
    }
}

pub(crate) fn bearer_header(token: &str) -> (String, String) {
    ("Authorization".to_string(), format!("Bearer {}", token))
}

pub(crate) fn json_body<B: Serialize + ?Sized>(segments: &[&str], body: &B) -> Result<Body, ClientError> {
    let bytes = serde_json::to_vec(body).map_err(|e| ClientError::Decode {
        path: routes::display_path(segments),
        message: format!("Failed to serialize request: {}", e),
    })?;
    Ok(Body {
        content_type: JSON,
        bytes,
    })
}

fn decode<R: DeserializeOwned>(segments: &[&str], response: &HttpResponse) -> Result<R, ClientError> {
    response.json().map_err(|e| ClientError::Decode {
        path: routes::display_path(segments),
        message: e.to_string(),
    })
}

fn status_error(path: String, response: &HttpResponse) -> ClientError {
    let detail = match response.json::<ErrorResponse>() {
        Ok(error) => error.message(),
        Err(_) => response.text(),
    };
    warn!(status = response.status, path = %path, detail = %detail, "Backend error response");
    ClientError::Status {
        status: response.status,
        path,
        detail,
    }
}
