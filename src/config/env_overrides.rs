use super::{AuthConfig, LogFormat, RuntimeConfig};
use anyhow::{anyhow, Result};

pub const ENV_PREFIX: &str = "TERASTORE_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the TERASTORE_ prefix.
    /// Used for the legacy BACKEND_URL variable.
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Legacy host:port form, e.g. BACKEND_URL=db.lab:8000
    if let Some(host) = get_raw_env_string(env, "BACKEND_URL")? {
        config.backend.url = legacy_backend_url(&host);
    }

    // Backend
    if let Some(url) = get_env_string(env, "BACKEND_URL")? {
        config.backend.url = url;
    }
    if let Some(val) = get_env_u64(env, "BACKEND_TIMEOUT_SECS")? {
        config.backend.timeout_secs = val;
    }

    // Caches
    if let Some(val) = get_env_usize(env, "CACHE_KEY_VALUES_CAPACITY")? {
        config.cache.key_values_capacity = val;
    }
    if let Some(val) = get_env_usize(env, "CACHE_FILTER_CAPACITY")? {
        config.cache.filter_capacity = val;
    }
    if let Some(val) = get_env_usize(env, "CACHE_PULSES_CAPACITY")? {
        config.cache.pulses_capacity = val;
    }

    // Upload
    if let Some(val) = get_env_u64(env, "UPLOAD_MAX_FILE_BYTES")? {
        config.upload.max_file_bytes = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.logging.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    // Credentials
    if let Some(username) = get_env_string(env, "USERNAME")? {
        ensure_auth(config).username = Some(username);
    }
    if let Some(token) = get_env_string(env, "TOKEN")? {
        ensure_auth(config).token = Some(token);
    }

    Ok(())
}

/// `BACKEND_URL` historically holds `host:port` without a scheme.
pub(crate) fn legacy_backend_url(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    }
}

fn ensure_auth(config: &mut RuntimeConfig) -> &mut AuthConfig {
    config.auth.get_or_insert_with(AuthConfig::default)
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key).filter(|v| !v.is_empty()))
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key).filter(|v| !v.is_empty()))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
