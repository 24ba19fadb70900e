// terastore configuration
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from TERASTORE_CONFIG env var
// 3. Config file contents from TERASTORE_CONFIG_CONTENT env var
// 4. Default config file locations (./terastore.toml, ./.terastore.toml)
// 5. Built-in defaults (lowest priority)
//
// CLI flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use terastore_client::CacheCapacities;
use terastore_core::DEFAULT_MAX_FILE_BYTES;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

/// Backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

pub const DEFAULT_BACKEND_URL: &str = "http://0.0.0.0:8000";

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Capacities of the memoized query caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub key_values_capacity: usize,
    pub filter_capacity: usize,
    pub pulses_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let defaults = CacheCapacities::default();
        Self {
            key_values_capacity: defaults.key_values,
            filter_capacity: defaults.filter,
            pulses_capacity: defaults.pulses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Stored credentials. The token, when present, is used as the session token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for CLI usage).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration with graceful fallback to defaults.
    /// Does not fail if a config file is missing or unreadable.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.backend = other.backend;
        self.cache = other.cache;
        self.upload = other.upload;
        self.logging = other.logging;

        if other.auth.is_some() {
            self.auth = other.auth;
        }
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Build a configuration from defaults, optional inline TOML and an
    /// `EnvSource`, without touching the filesystem or process environment.
    pub fn load_with_env<E: EnvSource>(inline_config: Option<&str>, env: &E) -> Result<Self> {
        let mut config = RuntimeConfig::default();

        if let Some(inline) = inline_config {
            let file_config: RuntimeConfig =
                toml::from_str(inline).context("Failed to parse inline config content")?;
            config.merge(file_config);
        }

        config.apply_env_overrides_from(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    pub fn cache_capacities(&self) -> CacheCapacities {
        CacheCapacities {
            key_values: self.cache.key_values_capacity,
            filter: self.cache.filter_capacity,
            pulses: self.cache.pulses_capacity,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|auth| auth.token.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|auth| auth.username.as_deref())
    }
}
