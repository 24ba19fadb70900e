//! Backend route paths and URL construction.

use url::Url;

pub const ATTR_KEYS: &[&str] = &["attrs", "keys"];
pub const ATTR_FILTER: &[&str] = &["attrs", "filter"];
pub const PULSES_GET: &[&str] = &["pulses", "get"];
pub const PULSES_CREATE: &[&str] = &["pulses", "create"];
pub const DEVICES: &[&str] = &["devices"];
pub const HEALTH: &[&str] = &["health"];

pub const AUTH_LOGIN: &[&str] = &["auth", "login"];
pub const AUTH_REFRESH: &[&str] = &["auth", "refresh"];
pub const AUTH_SIGNUP: &[&str] = &["auth", "signup"];
pub const USER_LOGOUT: &[&str] = &["user", "logout"];
pub const USER_LIST: &[&str] = &["user", "users"];
pub const USER_UPDATE: &[&str] = &["user", "update"];
pub const USER_DELETE: &[&str] = &["user", "delete"];

/// Segments of `GET /attrs/{key}/values`.
pub fn key_values(key: &str) -> Vec<&str> {
    vec!["attrs", key, "values"]
}

/// Segments of `GET /pulses/{id}`.
pub fn pulse(id: &str) -> Vec<&str> {
    vec!["pulses", id]
}

/// Append path segments to `base`, percent-encoding each one.
pub fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Path part of `segments` for logs and error messages.
pub fn display_path(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}
