use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataServiceError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ztable_core::ZtableError> for DataServiceError {
    fn from(e: ztable_core::ZtableError) -> Self {
        DataServiceError::InvalidRequest(e.to_string())
    }
}

pub type DataServiceResult<T> = Result<T, DataServiceError>;
