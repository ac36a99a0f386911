//! Error types for the Brass core crate.
//!
//! Plugin and registry errors live in `brass-framework`; this module only
//! covers what the core types themselves can fail with.

use thiserror::Error;

// =============================================================================
// Event Kind Errors
// =============================================================================

/// Returned when a string does not name a known [`EventKind`](crate::EventKind).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind '{0}'")]
pub struct UnknownEventKind(pub String);

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport is closed and cannot send any more events.
    #[error("transport closed: {reason}")]
    Closed {
        /// Reason for closure.
        reason: String,
    },

    /// Sending a batch of outgoing events failed.
    #[error("failed to send events: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
