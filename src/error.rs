//! Error types for rflink.

use thiserror::Error;

/// Main error type for all link operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// I/O error on a live stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither connection strategy could open a stream to the endpoint.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Operation requires a connected session.
    #[error("not connected")]
    NotConnected,

    /// The session's stream closed underneath a write.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using LinkError.
pub type Result<T> = std::result::Result<T, LinkError>;
