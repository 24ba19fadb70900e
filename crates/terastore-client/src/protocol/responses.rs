//! Response bodies

use serde::Deserialize;
use terastore_core::{AttrKey, CoreError, PulseId};

/// Entry of `GET /attrs/keys`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyEntry {
    pub name: String,
    pub data_type: String,
}

impl KeyEntry {
    pub fn into_key(self) -> Result<AttrKey, CoreError> {
        AttrKey::from_backend(self.name, &self.data_type)
    }
}

/// Row of `POST /attrs/filter`: `[pulse_id, creation_time]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterRow(pub PulseId, pub String);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body of `GET /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
}

/// FastAPI error body.
///
/// `detail` is a string for raised HTTP errors and a list of objects for
/// request validation failures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorResponse {
    pub detail: serde_json::Value,
}

impl ErrorResponse {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terastore_core::AttrKind;

    #[test]
    fn key_entries_map_to_kinds() {
        let entries: Vec<KeyEntry> =
            serde_json::from_str(r#"[{"name": "sample", "data_type": "string"}, {"name": "t", "data_type": "float"}]"#)
                .unwrap();
        let keys: Vec<AttrKey> = entries.into_iter().map(|e| e.into_key().unwrap()).collect();
        assert_eq!(keys[0].kind(), AttrKind::String);
        assert_eq!(keys[1].kind(), AttrKind::Number);
    }

    #[test]
    fn filter_rows_are_pairs() {
        let rows: Vec<FilterRow> =
            serde_json::from_str(r#"[[1, "2023-11-19T01:30:10"], ["abc", "2023-11-20T00:00:00Z"]]"#).unwrap();
        assert_eq!(rows[0].0, PulseId::new("1"));
        assert_eq!(rows[1].1, "2023-11-20T00:00:00Z");
    }

    #[test]
    fn refresh_accepts_camel_case() {
        let body: RefreshResponse = serde_json::from_str(r#"{"accessToken": "t"}"#).unwrap();
        assert_eq!(body.access_token, "t");
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": "t"}"#).unwrap();
        assert_eq!(token.token_type, "bearer");
    }

    #[test]
    fn error_detail_messages() {
        let plain: ErrorResponse = serde_json::from_str(r#"{"detail": "Incorrect username or password"}"#).unwrap();
        assert_eq!(plain.message(), "Incorrect username or password");

        let validation: ErrorResponse = serde_json::from_str(
            r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}, {"msg": "value is not a valid float"}]}"#,
        )
        .unwrap();
        assert_eq!(validation.message(), "field required; value is not a valid float");
    }
}
