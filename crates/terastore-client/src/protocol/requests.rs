//! Request bodies

use serde::Serialize;
use terastore_core::{canonical_order, AuthLevel, BackendFilter, PulseFilter};

/// Columns requested from `POST /attrs/filter`, in row order.
pub const FILTER_COLUMNS: [&str; 2] = ["pulse_id", "creation_time"];

/// Body of `POST /attrs/filter`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRequest {
    pub kv_pairs: Vec<BackendFilter>,
    pub columns: Vec<String>,
}

impl FilterRequest {
    /// Build a request with filters in canonical order.
    pub fn new(filters: &[PulseFilter]) -> Self {
        Self {
            kv_pairs: canonical_order(filters).iter().map(PulseFilter::to_backend).collect(),
            columns: FILTER_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// OAuth2 password form sent to `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl LoginForm<'_> {
    /// `application/x-www-form-urlencoded` encoding.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "password")
            .append_pair("username", self.username)
            .append_pair("password", self.password)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserRequest<'a> {
    pub email: &'a str,
    pub auth_level: AuthLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /devices`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceCreate<'a> {
    pub serial_number: &'a str,
}
