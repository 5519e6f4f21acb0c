//! Error types for the store layer.

use thiserror::Error;

/// Errors that can occur while persisting a collection.
///
/// These never escape the store boundary during a mutation: the store
/// catches and logs them, and the in-memory state stays authoritative for
/// the session.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("backend write failed for key {key}: {source}")]
    Backend {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
