//! Plugin system for the Brass framework.
//!
//! # Architecture
//!
//! A plugin is any `'static` type implementing [`Plugin`].  It reports a short
//! name and a [`Capabilities`] table listing the hooks and chat commands it
//! handles.  The table is captured once when the plugin is registered and is
//! what the registry consults when broadcasting: a plugin that does not
//! declare a hook is never called for it.
//!
//! Plugins do not hold references to the registry, the outgoing queue or the
//! current event.  Each hook receives a [`Context`] borrowing those for the
//! duration of the call.
//!
//! Classes are made available to the registry through the [`PluginCatalog`],
//! either at link time via [`PLUGIN_CLASSES`] or by explicit registration.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use brass::prelude::*;
//!
//! struct Greeter;
//!
//! impl Plugin for Greeter {
//!     fn name(&self) -> &str { "Greeter" }
//!
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::new().event(EventKind::Join)
//!     }
//!
//!     fn on_event(&mut self, ctx: &mut Context<'_>) -> HookResult {
//!         let event = ctx.event()?;
//!         if let (Some(nick), Some(channel)) = (event.nick(), event.target()) {
//!             ctx.privmsg(channel, &format!("welcome, {nick}"))?;
//!         }
//!         Ok(Flow::Continue)
//!     }
//! }
//!
//! handler.add_instance(Box::new(Greeter))?;
//! ```

pub mod catalog;
pub mod context;
pub mod contract;
pub mod handle;

pub use catalog::{PLUGIN_CLASSES, PluginCatalog, PluginClass, PluginConstructor, PluginConstructorFn};
pub use context::{Context, EMIT_PREFIX};
pub use contract::{
    AsAny, BRASS_PLUGIN_API_VERSION, Capabilities, CommandSpec, Flow, Hook, HookResult, Plugin,
    command_handler_name, is_compatible,
};
pub use handle::PluginHandle;

pub(crate) use contract::invoke;
