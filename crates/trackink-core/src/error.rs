//! Error types for the wire protocol, the relay client and the auth gate.

use thiserror::Error;

/// Errors raised while decoding or validating wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Unknown command action: {0}")]
    UnknownAction(String),
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the relay client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid WebSocket URL scheme: {0}")]
    InvalidScheme(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Raised when the auth guard refuses to let a peer start.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized to join the relay")]
    Unauthorized,
}
