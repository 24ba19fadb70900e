//! Authentication session

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use terastore_core::AuthLevel;

/// Claims carried in the backend's access token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub auth_level: Option<AuthLevel>,
    pub exp: i64,
}

impl Claims {
    /// Decode the payload segment of a JWT without verifying its signature.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Bearer token holder shared by a client and its callers.
///
/// The token is set on login, cleared on logout and refreshed lazily by the
/// client when a request finds it empty.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn claims(&self) -> Option<Claims> {
        self.token.read().as_deref().and_then(Claims::decode)
    }

    /// Level granted by the current token.
    ///
    /// No token means unauthorized. A token whose claims omit the level
    /// counts as a plain user.
    pub fn auth_level(&self) -> AuthLevel {
        if !self.is_authenticated() {
            return AuthLevel::Unauthorized;
        }
        self.claims()
            .and_then(|c| c.auth_level)
            .unwrap_or(AuthLevel::User)
    }

    /// True when the token's `exp` lies before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.claims()
            .and_then(|c| c.expires_at())
            .is_some_and(|exp| exp <= now)
    }
}
