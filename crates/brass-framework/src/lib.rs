//! # Brass Framework
//!
//! The dispatch core of the Brass bot framework.
//!
//! This layer provides:
//! - The [`Plugin`] contract, its explicit [`Capabilities`] table and the
//!   per-call [`Context`]
//! - [`PluginHandler`], the registry resolving, loading and broadcasting to
//!   plugins
//! - [`PluginFilter`], an exclusion view over the registry
//! - The built-in `Command` router, `Prioritize` scheduler and `Cron` plugins
//! - [`Settings`], the dotted-key configuration lookup handed to plugins
//!
//! Nothing here performs I/O; the runtime crate drives it from a transport.

pub mod builtin;
pub mod command;
pub mod error;
pub mod filter;
pub mod handler;
pub mod plugin;
pub mod prioritize;
pub mod settings;

pub use builtin::{Cron, JobId};
pub use command::{CommandMethodCache, CommandRouter};
pub use error::{PluginError, PluginResult};
pub use filter::PluginFilter;
pub use handler::{
    BUILTIN_PREFIX, BroadcastReport, HookFailure, PluginEntry, PluginHandler, PluginState,
    SearchPath,
};
pub use plugin::{
    BRASS_PLUGIN_API_VERSION, Capabilities, CommandSpec, Context, Flow, Hook, HookResult, Plugin,
    PluginCatalog, PluginClass, PluginHandle,
};
pub use prioritize::{PRECEDENCE, Prioritize, UnlistedPolicy, prioritize};
pub use settings::Settings;

// Re-exported for link-time plugin registration from downstream crates.
pub use linkme;
