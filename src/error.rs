//! Error types for the S3 storage adapter

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the host by adapter operations.
///
/// `exists`, `delete` and the serve handler never return these; their
/// failures are logged and collapsed into a boolean or a 404.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration for '{field}': {reason}")]
    Configuration { field: &'static str, reason: String },

    #[error("Failed to upload '{key}': {source}")]
    Upload {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid path: {0} is not served by this storage adapter")]
    InvalidPath(String),

    #[error("Failed to retrieve '{key}': {source}")]
    Retrieval {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration source error: {0}")]
    Settings(#[from] config::ConfigError),
}

impl Error {
    pub fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Configuration {
            field,
            reason: reason.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Error::configuration(field, "a non-empty value is required")
    }

    pub fn upload(key: impl Into<String>, source: StoreError) -> Self {
        Error::Upload {
            key: key.into(),
            source,
        }
    }

    pub fn retrieval(key: impl Into<String>, source: StoreError) -> Self {
        Error::Retrieval {
            key: key.into(),
            source,
        }
    }
}

/// Failure reported by an [`ObjectStore`](crate::storage::ObjectStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("body read failed: {0}")]
    Body(String),
}

impl StoreError {
    pub fn request(msg: impl Into<String>) -> Self {
        StoreError::Request(msg.into())
    }

    pub fn body(msg: impl Into<String>) -> Self {
        StoreError::Body(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
