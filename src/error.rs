//! Error types for the Marionette transport
//!
//! Provides a unified error type for all operations.
//!
//! Errors fall in two groups: failures that leave the connection unusable
//! (see [`MarionetteError::is_fatal`]) and failures that only concern the
//! current command. A remote failure reported by the browser is carried as
//! [`MarionetteError::Driver`].

use thiserror::Error;

use crate::protocol::DriverError;

/// Result type alias using MarionetteError
pub type Result<T> = std::result::Result<T, MarionetteError>;

/// Unified error type for Marionette transport operations
#[derive(Debug, Error)]
pub enum MarionetteError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Connection closed by remote end")]
    ConnectionClosed,

    #[error("A connection is already established, close it before connecting again")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Framing error: {0}")]
    Framing(String),

    #[error("Truncated frame: expected {expected} bytes, got {received}")]
    TruncatedFrame { expected: usize, received: usize },

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(u32),

    #[error("Invalid handshake: {0}")]
    Handshake(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Protocol desync: expected message id {expected}, got {received}")]
    ProtocolDesync { expected: u64, received: u64 },

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Failed to encode parameters: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode response value: {0}")]
    Decode(#[source] serde_json::Error),
}

impl MarionetteError {
    /// Whether the connection can no longer be trusted after this error.
    ///
    /// Driver, encode and decode failures leave the stream aligned on a frame
    /// boundary, so further commands may be issued.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MarionetteError::Driver(_)
                | MarionetteError::Encode(_)
                | MarionetteError::Decode(_)
                | MarionetteError::AlreadyConnected
                | MarionetteError::NotConnected
        )
    }

    /// The remote failure, if this error was reported by the browser
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            MarionetteError::Driver(e) => Some(e),
            _ => None,
        }
    }
}
