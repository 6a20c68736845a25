use thiserror::Error;

/// Errors raised by storage backends
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage quota exceeded: {0}")]
    Quota(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
