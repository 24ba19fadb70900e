// Configuration validation
//
// Validates that required fields are present and values are sensible

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

const LARGE_CACHE: usize = 10_000;
const LARGE_UPLOAD: u64 = 1024 * 1024 * 1024;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_backend_config(&config.backend)?;
    validate_cache_config(&config.cache)?;
    validate_upload_config(&config.upload)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_backend_config(config: &BackendConfig) -> Result<()> {
    if config.url.trim().is_empty() {
        bail!(
            "Backend URL is required\n\n\
            How to fix:\n\
              • Environment: export {}BACKEND_URL=http://localhost:8000\n\
              • TOML: [backend]\n              url = \"http://localhost:8000\"\n\
              • CLI: --backend-url http://localhost:8000\n",
            ENV_PREFIX
        );
    }

    let parsed = url::Url::parse(&config.url)
        .map_err(|e| anyhow::anyhow!("backend.url '{}' is not a valid URL: {}", config.url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("backend.url must use http or https, got '{}'", parsed.scheme());
    }

    if config.timeout_secs == 0 {
        bail!("backend.timeout_secs must be greater than 0");
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<()> {
    for (name, capacity) in [
        ("cache.key_values_capacity", config.key_values_capacity),
        ("cache.filter_capacity", config.filter_capacity),
        ("cache.pulses_capacity", config.pulses_capacity),
    ] {
        if capacity == 0 {
            bail!("{} must be greater than 0", name);
        }
        if capacity > LARGE_CACHE {
            warn!(capacity, "{} is very large; cached responses are kept in memory", name);
        }
    }
    Ok(())
}

fn validate_upload_config(config: &UploadConfig) -> Result<()> {
    if config.max_file_bytes == 0 {
        bail!("upload.max_file_bytes must be greater than 0");
    }

    if config.max_file_bytes > LARGE_UPLOAD {
        warn!(
            max_file_bytes = config.max_file_bytes,
            "upload.max_file_bytes is very large; files are read fully into memory"
        );
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("logging.level must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_backend_config() {
        assert!(validate_backend_config(&BackendConfig::default()).is_ok());

        let empty = BackendConfig {
            url: "  ".to_string(),
            ..Default::default()
        };
        let err = validate_backend_config(&empty).unwrap_err();
        assert!(err.to_string().contains("Backend URL is required"));

        let no_scheme = BackendConfig {
            url: "db.lab:8000".to_string(),
            ..Default::default()
        };
        assert!(validate_backend_config(&no_scheme).is_err());

        let zero_timeout = BackendConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(validate_backend_config(&zero_timeout).is_err());
    }

    #[test]
    fn test_validate_cache_config() {
        assert!(validate_cache_config(&CacheConfig::default()).is_ok());

        let zero = CacheConfig {
            filter_capacity: 0,
            ..Default::default()
        };
        let err = validate_cache_config(&zero).unwrap_err();
        assert!(err.to_string().contains("cache.filter_capacity"));

        // large is allowed, only warned about
        let large = CacheConfig {
            pulses_capacity: 1_000_000,
            ..Default::default()
        };
        assert!(validate_cache_config(&large).is_ok());
    }

    #[test]
    fn test_validate_upload_config() {
        assert!(validate_upload_config(&UploadConfig::default()).is_ok());
        assert!(validate_upload_config(&UploadConfig { max_file_bytes: 0 }).is_err());
    }

    #[test]
    fn test_validate_logging_config() {
        let empty = LoggingConfig {
            level: String::new(),
            ..Default::default()
        };
        assert!(validate_logging_config(&empty).is_err());
    }
}
