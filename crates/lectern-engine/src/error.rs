//! Error types for the sync engine.
//!
//! Everything here is non-fatal by design: a failed probe, request or send
//! degrades the engine to serving the best locally known state. None of
//! these types escape through the optimistic mutation surface.

use thiserror::Error;

/// Errors raised by the pub/sub transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("transport closed")]
    Closed,

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Errors raised by the liveness probe and snapshot endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("server unreachable: {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Unreachable(err.to_string())
        }
    }
}

/// Top-level engine error, surfaced only from explicit calls such as
/// [`crate::client::SyncClient::refresh`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("resync failed: {0}")]
    Resync(#[from] ApiError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
