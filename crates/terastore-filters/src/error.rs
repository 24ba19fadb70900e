use terastore_client::ClientError;
use thiserror::Error;

/// Contract violations of the filter store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Candidate keys are not loaded yet; fetch the initial state first")]
    Uninitialized,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
