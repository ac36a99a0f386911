//! Outgoing event scheduling by destructiveness.
//!
//! Before a pass's queue reaches the transport, events are reordered so the
//! least destructive go out first: a `privmsg` answering a user is sent
//! before the `part` or `quit` a plugin queued in the same pass.

use std::collections::HashMap;

use brass_core::{EventKind, EventQueue, OutgoingEvent};
use tracing::{debug, warn};

use crate::error::PluginResult;
use crate::plugin::{Capabilities, Context, Flow, Hook, HookResult, Plugin};

/// Setting selecting [`UnlistedPolicy::Drop`] when `true`.
pub const DROP_UNLISTED_SETTING: &str = "prioritize.drop_unlisted";

/// Event kinds from least to most destructive.
pub const PRECEDENCE: [EventKind; 28] = [
    EventKind::Raw,
    EventKind::Pass,
    EventKind::User,
    EventKind::Ping,
    EventKind::Pong,
    EventKind::Notice,
    EventKind::Join,
    EventKind::List,
    EventKind::Names,
    EventKind::Version,
    EventKind::Stats,
    EventKind::Links,
    EventKind::Time,
    EventKind::Trace,
    EventKind::Admin,
    EventKind::Info,
    EventKind::Who,
    EventKind::Whois,
    EventKind::Whowas,
    EventKind::Mode,
    EventKind::Privmsg,
    EventKind::Action,
    EventKind::Nick,
    EventKind::Topic,
    EventKind::Invite,
    EventKind::Kill,
    EventKind::Part,
    EventKind::Quit,
];

/// What happens to events whose kind is not in the precedence list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlistedPolicy {
    /// Keep them after all listed kinds, in arrival order.
    #[default]
    Append,
    /// Discard them.
    Drop,
}

/// Reorders `queue` by `precedence`.
///
/// Events of the same kind keep their relative order.
pub fn prioritize(queue: &mut EventQueue, precedence: &[EventKind], policy: UnlistedPolicy) {
    let mut buckets: HashMap<EventKind, Vec<OutgoingEvent>> = HashMap::new();
    let mut unlisted = Vec::new();
    for event in queue.take() {
        if precedence.contains(&event.kind()) {
            buckets.entry(event.kind()).or_default().push(event);
        } else {
            unlisted.push(event);
        }
    }

    let mut ordered: Vec<OutgoingEvent> = precedence
        .iter()
        .filter_map(|kind| buckets.remove(kind))
        .flatten()
        .collect();

    match policy {
        UnlistedPolicy::Append => ordered.extend(unlisted),
        UnlistedPolicy::Drop if !unlisted.is_empty() => {
            warn!(dropped = unlisted.len(), "Dropping events of unscheduled kinds");
        }
        UnlistedPolicy::Drop => {}
    }
    queue.replace_events(ordered);
}

/// Built-in plugin applying [`prioritize`] on `preDispatch`.
#[derive(Debug, Clone)]
pub struct Prioritize {
    precedence: Vec<EventKind>,
    policy: UnlistedPolicy,
}

impl Default for Prioritize {
    fn default() -> Self {
        Self {
            precedence: PRECEDENCE.to_vec(),
            policy: UnlistedPolicy::default(),
        }
    }
}

impl Prioritize {
    pub const NAME: &'static str = "Prioritize";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: UnlistedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_precedence(mut self, precedence: impl Into<Vec<EventKind>>) -> Self {
        self.precedence = precedence.into();
        self
    }

    pub fn policy(&self) -> UnlistedPolicy {
        self.policy
    }
}

impl Plugin for Prioritize {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new().hook(Hook::PreDispatch)
    }

    fn on_load(&mut self, ctx: &mut Context<'_>) -> PluginResult<()> {
        if let Ok(config) = ctx.config()
            && config.get_bool(DROP_UNLISTED_SETTING) == Some(true)
        {
            self.policy = UnlistedPolicy::Drop;
        }
        debug!(policy = ?self.policy, "Scheduler ready");
        Ok(())
    }

    fn pre_dispatch(&mut self, ctx: &mut Context<'_>) -> HookResult {
        prioritize(ctx.events()?, &self.precedence, self.policy);
        Ok(Flow::Continue)
    }
}
