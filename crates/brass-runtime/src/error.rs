//! Runtime error types.

use brass_core::TransportError;
use brass_framework::PluginError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that end a runtime operation.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A registry operation failed, or a hook raised a fatal error.
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// The transport rejected an outgoing batch.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
