//! Cache error definitions.
//!
//! None of these ever reach a facade caller; they are logged and folded into
//! `false` / `None` at the facade boundary.

use thiserror::Error;

/// Failure talking to the remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the store or the connection dropped.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an error.
    #[error("store command {command} failed: {message}")]
    Command { command: &'static str, message: String },
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error()
            || e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_timeout()
        {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Command {
                command: "redis",
                message: e.to_string(),
            }
        }
    }
}

/// Errors that can occur inside a facade operation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for facade internals.
pub type CacheResult<T> = Result<T, CacheError>;
