//! # Error Types
//!
//! Custom error types for DualShock Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for DualShock Bridge
#[derive(Debug, Error)]
pub enum DualShockBridgeError {
    /// Controller bus protocol errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Device buffer capacity is too small for the protocol
    #[error("Invalid buffer size {size} (minimum {minimum})")]
    BufferSize { size: usize, minimum: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Save-state snapshot encoding errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for DualShock Bridge
pub type Result<T> = std::result::Result<T, DualShockBridgeError>;
