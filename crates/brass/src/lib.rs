//! # Brass
//!
//! A plugin-driven chat bot framework for Rust.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ Event ┌─────────────────────────────────────────────┐ batch ┌───────────┐
//! │ Transport │──────▶│ preEvent ─▶ on<Kind> ─▶ preDispatch ─▶ send │──────▶│ Transport │
//! └───────────┘       │            (Command)    (Prioritize)         │       └───────────┘
//!                     └─────────────────────────────────────────────┘
//! ```
//!
//! - **Core** ([`core`]): events, the outgoing queue, the transport surface
//! - **Framework** ([`framework`]): the plugin contract, the registry, the
//!   command router, the scheduler and the built-in plugins
//! - **Runtime** ([`runtime`]): configuration, logging and the event loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brass::prelude::*;
//!
//! struct Dice;
//!
//! impl Plugin for Dice {
//!     fn name(&self) -> &str { "Dice" }
//!
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::new().command(CommandSpec::new("roll").required(1))
//!     }
//!
//!     fn on_command(&mut self, ctx: &mut Context<'_>, _: &str, args: &[String]) -> HookResult {
//!         let target = ctx.event()?.reply_target().unwrap_or_default().to_string();
//!         ctx.privmsg(&target, &format!("rolling {}", args[0]))?;
//!         Ok(Flow::Continue)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut transport, peer) = ChannelTransport::pair(64);
//!     // hand `peer` to the connection task
//!
//!     let mut runtime = BrassRuntime::new()?;
//!     runtime.plugins_mut().add_instance(Box::new(Dice))?;
//!     runtime.run(&mut transport).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `builtin` *(default)*: the `Command`, `Prioritize` and `Cron` plugins
//! - `toml-config` *(default)*: `brass.toml` configuration files
//! - `yaml-config`: `brass.yaml` configuration files
//! - `json-log`: JSON log output

pub use brass_core as core;
pub use brass_framework as framework;
pub use brass_runtime as runtime;

/// Commonly used types for writing plugins and running a bot.
///
/// ```rust,ignore
/// use brass::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use brass_runtime::{BrassConfig, BrassRuntime, RuntimeError, RuntimeResult};

    // Plugin contract
    pub use brass_framework::{
        Capabilities, CommandSpec, Context, Flow, Hook, HookResult, Plugin, PluginError,
        PluginResult,
    };

    // Registry
    pub use brass_framework::{PluginCatalog, PluginFilter, PluginHandle, PluginHandler, Settings};

    // Built-in plugins
    pub use brass_framework::{CommandRouter, Cron, Prioritize};

    // Events and transport
    pub use brass_core::{
        ChannelTransport, Connection, Event, EventKind, Hostmask, OutgoingEvent, Transport,
    };
}
