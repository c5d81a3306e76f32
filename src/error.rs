//! Error types for autodial
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in the dialer core
#[derive(Debug, Error)]
pub enum DialerError {
    /// Malformed input that could not be clamped into range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Every queued number was removed by the DNC filter
    #[error("Queue is empty after DNC filtering. {skipped} numbers were in DNC list.")]
    EmptyQueue { skipped: usize },

    /// DNC fetch, CSV upload or SMS API failure
    #[error("Network error: {0}")]
    Network(String),

    /// The host bridge rejected or failed a command
    #[error("Native bridge error: {0}")]
    NativeBridge(String),

    /// Completion event that does not belong to the current dispatch
    #[error("Stale event: {0}")]
    StaleEvent(String),

    /// Operation not allowed in the current dispatch phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Call log not found in storage
    #[error("Call log not found: {0}")]
    CallLogNotFound(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV encoding/decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DialerError {
    /// Errors the user must see before dialing can continue
    pub fn is_blocking(&self) -> bool {
        matches!(self, DialerError::EmptyQueue { .. } | DialerError::NativeBridge(_))
    }

    /// Errors that are dropped without telling the user
    pub fn is_silent(&self) -> bool {
        matches!(self, DialerError::Validation(_) | DialerError::StaleEvent(_))
    }
}

impl From<reqwest::Error> for DialerError {
    fn from(err: reqwest::Error) -> Self {
        DialerError::Network(err.to_string())
    }
}

/// Result type alias for dialer operations
pub type Result<T> = std::result::Result<T, DialerError>;
