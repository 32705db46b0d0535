//! Error types for irk-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("Socket connection broken")]
    ConnectionBroken,

    #[error("Receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("Receiver task aborted: {0}")]
    ReceiverAborted(String),

    #[error("Interrupted")]
    Interrupted,

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<tokio::task::JoinError> for CoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        CoreError::ReceiverAborted(err.to_string())
    }
}
