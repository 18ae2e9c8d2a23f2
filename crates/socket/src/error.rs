//! Error types for the socket adapter.

use thiserror::Error;

/// Result type alias for socket operations
pub type SocketResult<T> = Result<T, SocketError>;

/// Main error type for the socket adapter
#[derive(Debug, Error)]
pub enum SocketError {
    /// An inbound frame failed validation into the typed entities; partial
    /// or undefined fields never propagate past the boundary.
    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Handshake failed: {message}")]
    Handshake { message: String },
}

impl SocketError {
    /// Create a malformed payload error
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a handshake error
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }
}

// Conversion from common error types
impl From<serde_json::Error> for SocketError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<chrono::ParseError> for SocketError {
    fn from(err: chrono::ParseError) -> Self {
        Self::MalformedPayload {
            message: format!("Timestamp parsing error: {}", err),
        }
    }
}
