//! Transport error types.
//!
//! All failures are absorbed at the transport boundary: nothing here
//! propagates as an `Err` to callers of the public [`crate::SessionClient`]
//! operations. These types exist for the socket seam and internal tasks,
//! where errors flow with `?`, and for structured log output.

use thiserror::Error;

/// Errors arising at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The auth source reports unauthenticated or an empty token.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Connection to the endpoint failed to establish.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection was closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Failed to hand a frame to the socket tasks.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Message serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound frame was not valid structured data.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
