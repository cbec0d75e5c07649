//! Error types for the server client.

use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Errors returned by `CinefeedClient` methods.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),

    #[error("server disconnected")]
    Disconnected,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("server error: {}: {}", .0.error, .0.message)]
    Server(ErrorResponse),
}

impl ClientError {
    /// The server's error kind (`NotFound`, `InvalidArgument`, ...), if the
    /// server answered with an error.
    pub fn server_kind(&self) -> Option<&str> {
        match self {
            ClientError::Server(e) => Some(&e.error),
            _ => None,
        }
    }
}
