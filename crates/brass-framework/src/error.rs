//! Error types for the Brass framework.

use std::path::PathBuf;

use brass_core::UnknownEventKind;
use thiserror::Error;

/// Errors raised by the plugin registry, the plugin contract and hooks.
///
/// Registry and lifecycle errors are never recovered internally: they reach
/// the caller of the registry operation that triggered them. Errors returned
/// from hooks during a broadcast are logged and recorded at the per-plugin
/// boundary instead, except [`PluginError::Fatal`], which aborts the pass.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// A search path directory could not be read.
    #[error("plugin directory '{}' is not readable: {reason}", path.display())]
    DirectoryNotReadable {
        /// The rejected directory.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },

    /// No search path yields a resolvable class for the short name.
    #[error("no plugin class found for '{name}'")]
    ClassNotFound {
        /// The requested short name.
        name: String,
    },

    /// The class was built against an incompatible plugin contract.
    #[error("class '{class}' implements plugin API {found:#x}, host expects {expected:#x}")]
    IncorrectBaseClass {
        /// Fully qualified class name.
        class: String,
        /// API version reported by the instance.
        found: u32,
        /// API version of this host.
        expected: u32,
    },

    /// The class is abstract or its constructor rejected the arguments.
    #[error("class '{class}' cannot be instantiated: {reason}")]
    ClassNotInstantiable {
        /// Fully qualified class name.
        class: String,
        /// Why construction failed.
        reason: String,
    },

    /// The plugin is not loaded and autoload is disabled.
    #[error("plugin '{0}' is not loaded")]
    PluginNotLoaded(String),

    /// A plugin aborted its own registration from `on_load`.
    #[error("plugin '{plugin}' requirement unsatisfied: {message}")]
    RequirementUnsatisfied {
        /// The plugin that failed.
        plugin: String,
        /// Message passed to `fail`.
        message: String,
    },

    /// A dynamic call matched neither the hook nor the emission convention.
    #[error("invalid call '{0}'")]
    InvalidCall(String),

    /// The context has no configuration attached.
    #[error("no configuration handler set")]
    NoConfigHandler,

    /// The context has no plugin handler attached.
    #[error("no plugin handler set")]
    NoPluginHandler,

    /// The context has no outgoing event queue attached.
    #[error("no event handler set")]
    NoEventHandler,

    /// The context has no connection attached.
    #[error("no connection set")]
    NoConnection,

    /// The context has no inbound event attached.
    #[error("no event set")]
    NoEvent,

    /// The plugin is already locked, e.g. by a hook that is currently running.
    #[error("plugin '{0}' is busy")]
    PluginBusy(String),

    /// A plugin handle was downcast to the wrong concrete type.
    #[error("plugin '{plugin}' is not a {expected}")]
    TypeMismatch {
        /// Plugin short name.
        plugin: String,
        /// Requested type name.
        expected: &'static str,
    },

    /// Unrecoverable failure; stops the dispatch pass and the runtime.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// Failure raised by a plugin's own hook logic.
    #[error("{0}")]
    Hook(String),
}

impl PluginError {
    /// Creates a hook failure with a custom message.
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Creates a fatal error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Returns `true` for errors that must abort the current pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<UnknownEventKind> for PluginError {
    fn from(err: UnknownEventKind) -> Self {
        Self::InvalidCall(err.0)
    }
}

/// Result type for plugin and registry operations.
pub type PluginResult<T> = Result<T, PluginError>;
