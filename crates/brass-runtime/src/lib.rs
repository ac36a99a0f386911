//! Brass Runtime - drives the dispatch core from a transport.
//!
//! This crate provides:
//! - The dispatch pass ([`DispatchLoop`]): hooks, scheduling, emission
//! - The event loop ([`BrassRuntime`]): connect, inbound events, ticks, shutdown
//! - Layered configuration ([`config`]) and its validation
//! - Logging setup ([`logging`])
//!
//! ```ignore
//! use brass_core::ChannelTransport;
//! use brass_runtime::BrassRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut transport, peer) = ChannelTransport::pair(64);
//!     // hand `peer` to the connection task
//!
//!     let mut runtime = BrassRuntime::new()?;
//!     runtime.run(&mut transport).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{BrassConfig, ConfigError, ConfigLoader, ConfigResult, load_config};
pub use dispatch::{DispatchLoop, PassReport, Phase};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{BrassRuntime, RuntimeBuilder};

// Re-export tracing for use by plugin crates
pub use tracing;

/// Logging macros for plugin code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
