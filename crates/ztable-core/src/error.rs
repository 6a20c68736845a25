//! Error types for ZTable

use thiserror::Error;

use crate::{FieldType, FilterOperator};

/// Core error type for ZTable operations
#[derive(Error, Debug)]
pub enum ZtableError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Operator '{operator}' is not valid for {field_type} fields")]
    InvalidOperator {
        operator: FilterOperator,
        field_type: FieldType,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ZTable operations
pub type Result<T> = std::result::Result<T, ZtableError>;
