//! Error types for schema synchronization

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema synchronization errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Collection not found: {collection}")]
    CollectionNotFound { collection: String },

    #[error("Schema endpoint unreachable at {url}: {reason}")]
    SchemaUnreachable { url: String, reason: String },

    #[error("Malformed schema for collection {collection}: {detail}")]
    MalformedSchema { collection: String, detail: String },

    #[error("Missing required parameter: {0}")]
    MissingRequiredField(String),

    #[error("Field '{field}' does not exist in collection {collection}")]
    FieldNotFound { collection: String, field: String },

    #[error("Cannot copy a field of type '{source_type}' into type '{dest_type}'")]
    TypeIncompatible { source_type: String, dest_type: String },

    #[error("Cannot copy multi-valued field '{source_field}' into single-valued field '{dest_field}'")]
    MultiValuedMismatch { source_field: String, dest_field: String },

    #[error("Copy field rule {source_field} -> {dest_field} already exists")]
    DuplicateCopyFieldRule { source_field: String, dest_field: String },

    #[error("maxChars must be a positive integer, got {0}")]
    InvalidMaxChars(i64),

    #[error("Document {doc_index}: value {value} of field '{field}' does not match type '{expected_type}'")]
    TypeMismatch {
        doc_index: usize,
        field: String,
        value: serde_json::Value,
        expected_type: String,
    },

    #[error("Schema mutation rejected by collection {collection}: {detail}")]
    MutationRejected { collection: String, detail: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// HTTP status a routing layer should answer with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            SchemaError::ClientNotFound(_) | SchemaError::CollectionNotFound { .. } => 404,
            SchemaError::MissingRequiredField(_)
            | SchemaError::FieldNotFound { .. }
            | SchemaError::TypeIncompatible { .. }
            | SchemaError::MultiValuedMismatch { .. }
            | SchemaError::DuplicateCopyFieldRule { .. }
            | SchemaError::InvalidMaxChars(_)
            | SchemaError::TypeMismatch { .. } => 400,
            SchemaError::SchemaUnreachable { .. }
            | SchemaError::MalformedSchema { .. }
            | SchemaError::MutationRejected { .. } => 502,
            SchemaError::Config(_) | SchemaError::Json(_) | SchemaError::Io(_) => 500,
        }
    }

    /// Whether the error reflects caller input rather than engine state
    pub fn is_caller_error(&self) -> bool {
        self.http_status() == 400
    }
}
