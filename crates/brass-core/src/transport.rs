//! Transport surface consumed by the dispatch loop.
//!
//! A [`Transport`] is the only thing that touches the network. It produces a
//! lazy, unbounded sequence of inbound [`Event`]s and accepts the ordered batch
//! of [`OutgoingEvent`]s each dispatch pass produced.
//!
//! [`ChannelTransport`] bridges the runtime to `tokio` channels. Hosts that
//! own their own codec feed decoded events into the sender half and encode
//! whatever comes out of the receiver half.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::event::Event;
use crate::queue::OutgoingEvent;

/// Interface between the dispatch loop and the protocol connection.
#[async_trait]
pub trait Transport: Send {
    /// Waits for the next inbound event.
    ///
    /// Returns `None` once the connection is gone and no more events will
    /// arrive; the runtime stops in that case.
    async fn next_event(&mut self) -> Option<Event>;

    /// Sends one finished, already-ordered batch of outgoing events.
    async fn send(&mut self, events: Vec<OutgoingEvent>) -> TransportResult<()>;
}

/// A [`Transport`] backed by a pair of `tokio` mpsc channels.
pub struct ChannelTransport {
    inbound: mpsc::Receiver<Event>,
    outbound: mpsc::Sender<Vec<OutgoingEvent>>,
}

/// The host-side ends of a [`ChannelTransport`].
pub struct ChannelPeer {
    /// Feed decoded inbound events here.
    pub events: mpsc::Sender<Event>,
    /// Ordered outgoing batches arrive here, one per dispatch pass.
    pub outgoing: mpsc::Receiver<Vec<OutgoingEvent>>,
}

impl ChannelTransport {
    /// Creates a transport and its host-side peer with the given buffer size.
    pub fn pair(buffer: usize) -> (Self, ChannelPeer) {
        let (event_tx, event_rx) = mpsc::channel(buffer);
        let (out_tx, out_rx) = mpsc::channel(buffer);
        (
            Self {
                inbound: event_rx,
                outbound: out_tx,
            },
            ChannelPeer {
                events: event_tx,
                outgoing: out_rx,
            },
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn next_event(&mut self) -> Option<Event> {
        self.inbound.recv().await
    }

    async fn send(&mut self, events: Vec<OutgoingEvent>) -> TransportResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        debug!(count = events.len(), "Sending outgoing batch");
        self.outbound
            .send(events)
            .await
            .map_err(|_| TransportError::Closed {
                reason: "outgoing receiver dropped".to_string(),
            })
    }
}
