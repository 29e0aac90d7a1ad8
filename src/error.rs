//! Error types for uart-bridge.

use thiserror::Error;

/// Main error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O error on the output channel or serial handle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure opening or configuring the serial port.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// JSON serialization error on the primary output channel.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transport reader thread has stopped and its channel drained.
    #[error("transport closed")]
    TransportClosed,
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
