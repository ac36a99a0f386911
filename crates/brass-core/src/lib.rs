//! # Brass Core
//!
//! The core types of the Brass bot framework.
//!
//! This crate holds everything the dispatch core and a transport need to agree
//! on, and nothing else:
//!
//! - **Inbound events**: [`Event`], [`EventKind`], [`Hostmask`]
//! - **Outgoing events**: [`OutgoingEvent`] and the per-pass [`EventQueue`]
//! - **Connection identity**: [`Connection`]
//! - **Transport surface**: the [`Transport`] trait and [`ChannelTransport`]
//!
//! ```text
//! ┌───────────┐  Event   ┌───────────────┐  Vec<OutgoingEvent>  ┌───────────┐
//! │ Transport │────────▶│ Dispatch loop │────────────────────▶│ Transport │
//! └───────────┘          └───────────────┘                      └───────────┘
//! ```

pub mod connection;
pub mod error;
pub mod event;
pub mod queue;
pub mod transport;

pub use connection::Connection;
pub use error::{TransportError, TransportResult, UnknownEventKind};
pub use event::{Event, EventKind, Hostmask};
pub use queue::{EventQueue, OutgoingEvent};
pub use transport::{ChannelPeer, ChannelTransport, Transport};
