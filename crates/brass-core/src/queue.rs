//! Outgoing events and the per-pass event queue.
//!
//! Plugins never perform I/O directly. Every emission appends an
//! [`OutgoingEvent`] to the [`EventQueue`] of the current dispatch pass; the
//! queue is reordered by the scheduler and drained into the transport once the
//! pass is finished.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event::EventKind;

/// An event a plugin asked to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEvent {
    /// Short name of the emitting plugin.
    source: String,
    kind: EventKind,
    args: Vec<String>,
}

impl OutgoingEvent {
    pub fn new<I, S>(source: impl Into<String>, kind: EventKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: source.into(),
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the short name of the plugin that emitted this event.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Mutable access to the arguments, for content-rewriting plugins.
    pub fn args_mut(&mut self) -> &mut Vec<String> {
        &mut self.args
    }
}

/// Ordered, mutable collection of the events one dispatch pass produced.
///
/// Insertion order is preserved until something calls
/// [`replace_events`](Self::replace_events) (the scheduler) or removes
/// entries (content filters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    events: Vec<OutgoingEvent>,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new event. Never blocks and never touches the transport.
    pub fn add<I, S>(&mut self, source: impl Into<String>, kind: EventKind, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events.push(OutgoingEvent::new(source, kind, args));
    }

    /// Appends an already-built event.
    pub fn push(&mut self, event: OutgoingEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[OutgoingEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutgoingEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, OutgoingEvent> {
        self.events.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the distinct kinds currently queued.
    pub fn kinds(&self) -> BTreeSet<EventKind> {
        self.events.iter().map(OutgoingEvent::kind).collect()
    }

    /// Returns `true` if at least one queued event has the given kind.
    pub fn has_kind(&self, kind: EventKind) -> bool {
        self.events.iter().any(|e| e.kind() == kind)
    }

    /// Replaces the whole contents of the queue.
    pub fn replace_events(&mut self, events: Vec<OutgoingEvent>) {
        self.events = events;
    }

    /// Removes the first event equal to `event`.
    ///
    /// Returns `true` when something was removed.
    pub fn remove_event(&mut self, event: &OutgoingEvent) -> bool {
        match self.events.iter().position(|e| e == event) {
            Some(pos) => {
                self.events.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the event at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<OutgoingEvent> {
        (index < self.events.len()).then(|| self.events.remove(index))
    }

    /// Keeps only the events for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&OutgoingEvent) -> bool) {
        self.events.retain(keep);
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Takes every queued event, leaving the queue empty.
    pub fn take(&mut self) -> Vec<OutgoingEvent> {
        std::mem::take(&mut self.events)
    }
}

impl IntoIterator for EventQueue {
    type Item = OutgoingEvent;
    type IntoIter = std::vec::IntoIter<OutgoingEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventQueue {
    type Item = &'a OutgoingEvent;
    type IntoIter = std::slice::Iter<'a, OutgoingEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<OutgoingEvent> for EventQueue {
    fn from_iter<T: IntoIterator<Item = OutgoingEvent>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order_and_source() {
        let mut queue = EventQueue::new();
        queue.add("Ping", EventKind::Privmsg, ["#rust", "pong"]);
        queue.add("Quit", EventKind::Quit, ["bye"]);

        let kinds: Vec<_> = queue.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::Privmsg, EventKind::Quit]);
        assert_eq!(queue.events()[0].source(), "Ping");
        assert_eq!(queue.events()[0].args(), ["#rust", "pong"]);
    }

    #[test]
    fn test_remove_event_removes_first_match_only() {
        let mut queue = EventQueue::new();
        queue.add("A", EventKind::Join, ["#a"]);
        queue.add("A", EventKind::Join, ["#a"]);
        let target = OutgoingEvent::new("A", EventKind::Join, ["#a"]);

        assert!(queue.remove_event(&target));
        assert_eq!(queue.len(), 1);
        assert!(queue.remove_event(&target));
        assert!(!queue.remove_event(&target));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut queue = EventQueue::new();
        assert!(queue.remove(0).is_none());
    }

    #[test]
    fn test_kinds_and_take() {
        let mut queue = EventQueue::new();
        queue.add("A", EventKind::Quit, Vec::<String>::new());
        queue.add("B", EventKind::Join, ["#a"]);
        queue.add("C", EventKind::Join, ["#b"]);

        assert_eq!(queue.kinds().len(), 2);
        assert!(queue.has_kind(EventKind::Quit));
        assert!(!queue.has_kind(EventKind::Part));

        let taken = queue.take();
        assert_eq!(taken.len(), 3);
        assert!(queue.is_empty());
    }
}
