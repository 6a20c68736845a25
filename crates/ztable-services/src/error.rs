use thiserror::Error;
use ztable_core::ZtableError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-facing messages
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The transport failed or the endpoint answered with a non-success status
    #[error("{0}")]
    Transport(String),

    /// Superseded by a newer request. Never shown to the user.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Misconfiguration: {0}")]
    Misconfigured(String),

    #[error("Update rejected: {0}")]
    UpdateRejected(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Cell {0} is already saving")]
    AlreadySaving(String),

    #[error("Cell {0} is not being edited")]
    NotEditing(String),

    #[error("Facet lookup failed for '{field}': {message}")]
    Facet { field: String, message: String },

    #[error(transparent)]
    Core(#[from] ZtableError),
}

impl ServiceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServiceError::Cancelled)
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Transport(format!("Request timed out: {}", e))
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

impl From<ztable_server::DataServiceError> for ServiceError {
    fn from(e: ztable_server::DataServiceError) -> Self {
        ServiceError::Transport(e.to_string())
    }
}
