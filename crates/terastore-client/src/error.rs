use terastore_core::CoreError;
use thiserror::Error;

/// Errors surfaced by [`crate::TeraStoreClient`].
///
/// Network failures are reported as-is; nothing here is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Backend returned HTTP {status} for {path}: {detail}")]
    Status { status: u16, path: String, detail: String },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Invalid backend URL '{0}'")]
    InvalidUrl(String),

    #[error(transparent)]
    Contract(#[from] CoreError),
}

impl ClientError {
    /// HTTP status for [`ClientError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}
