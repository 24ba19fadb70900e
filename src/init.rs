// Initialization utilities
//
// Logging/tracing setup and construction of the backend client stack

use crate::config::{LogFormat, RuntimeConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use terastore_client::{CachedQueries, ReqwestHttpClient, Session, TeraStoreClient};
use tracing::{debug, info};

/// Client, cached queries and session built from one configuration.
pub struct Backend {
    pub client: Arc<TeraStoreClient<ReqwestHttpClient>>,
    pub queries: Arc<CachedQueries<ReqwestHttpClient>>,
    pub session: Arc<Session>,
}

/// Build the HTTP client stack from RuntimeConfig
pub fn connect(config: &RuntimeConfig) -> Result<Backend> {
    let session = Arc::new(match config.token() {
        Some(token) => Session::with_token(token),
        None => Session::new(),
    });

    let http = ReqwestHttpClient::new(config.request_timeout())?;
    let client = TeraStoreClient::new(http, &config.backend.url, session.clone())
        .with_context(|| format!("Invalid backend URL: {}", config.backend.url))?;
    let client = Arc::new(client);

    let queries = Arc::new(CachedQueries::new(client.clone(), config.cache_capacities()));

    info!(backend = %client.base_url(), "Connected client");
    debug!(
        authenticated = session.is_authenticated(),
        capacities = ?config.cache_capacities(),
        "Client configuration"
    );

    Ok(Backend {
        client,
        queries,
        session,
    })
}

/// Initialize tracing/logging from RuntimeConfig
///
/// Logs go to stderr; stdout is reserved for command output.
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Try to set the global subscriber; ignore error if already set (idempotent)
    let _ = match config.logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_writer(std::io::stderr)),
        ),
    };
}
