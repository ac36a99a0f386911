//! The dispatch pass.
//!
//! [`DispatchLoop`] owns the registry, the outgoing queue and the dispatch
//! filter.  Each [`Phase`] becomes one pass:
//!
//! ```text
//! Connect ─► onConnect ─┐
//! Tick ────► onTick ────┤
//! Event ───► preEvent ──┼─► preDispatch ─► transport.send(queue) ─► postDispatch
//!             └─ unless stopped: on<Kind> (Command routes onCommand<Word>)
//! ```
//!
//! Events emitted during `postDispatch` stay in the queue and go out with the
//! next pass.

use brass_core::{Connection, Event, EventQueue, OutgoingEvent, Transport};
use brass_framework::{
    BroadcastReport, Context, Hook, PluginFilter, PluginHandler, PluginResult, Settings,
};
use tracing::{Instrument, debug, debug_span, trace};

use crate::error::RuntimeResult;

/// Name the dispatch loop uses for its own context.
const DISPATCHER: &str = "dispatch";

/// What triggered a dispatch pass.
#[derive(Debug, Clone)]
pub enum Phase {
    /// The transport is connected.
    Connect,
    /// The tick interval elapsed.
    Tick,
    /// An inbound event arrived.
    Event(Event),
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Tick => "tick",
            Self::Event(event) => event.kind().as_str(),
        }
    }

    fn event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Every hook broadcast of the pass, merged.
    pub hooks: BroadcastReport,
    /// Plugin whose `preEvent` stopped per-kind handling.
    pub pre_event_stopped_by: Option<String>,
    /// Number of outgoing events handed to the transport.
    pub sent: usize,
}

/// Owns the dispatch state and runs passes over a transport.
#[derive(Debug)]
pub struct DispatchLoop {
    plugins: PluginHandler,
    queue: EventQueue,
    filter: PluginFilter,
}

impl DispatchLoop {
    pub fn new(plugins: PluginHandler) -> Self {
        Self {
            plugins,
            queue: EventQueue::new(),
            filter: PluginFilter::new(),
        }
    }

    pub fn plugins(&self) -> &PluginHandler {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginHandler {
        &mut self.plugins
    }

    /// Filter applied to every hook broadcast of a pass.
    pub fn filter(&self) -> &PluginFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut PluginFilter {
        &mut self.filter
    }

    /// Events waiting for the next send.
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Runs one full pass and sends what it produced.
    pub async fn run_pass<T>(&mut self, transport: &mut T, phase: Phase) -> RuntimeResult<PassReport>
    where
        T: Transport + ?Sized,
    {
        let span = debug_span!("pass", phase = phase.label());
        async {
            let mut report = self.prepare(&phase)?;
            let batch = self.queue.take();
            report.sent = batch.len();
            if !batch.is_empty() {
                trace!(count = batch.len(), "Handing batch to transport");
            }
            transport.send(batch).await?;
            self.finish(&phase, &mut report)?;
            debug!(
                invoked = report.hooks.invoked().len(),
                failures = report.hooks.failures().len(),
                sent = report.sent,
                "Pass complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Runs every hook up to and including `preDispatch`.
    fn prepare(&mut self, phase: &Phase) -> PluginResult<PassReport> {
        let mut report = PassReport::default();
        match phase {
            Phase::Connect => report.hooks = self.broadcast(&Hook::Connect, None)?,
            Phase::Tick => report.hooks = self.broadcast(&Hook::Tick, None)?,
            Phase::Event(event) => {
                let pre = self.broadcast(&Hook::PreEvent, Some(event))?;
                report.pre_event_stopped_by = pre.stopped_by().map(str::to_string);
                report.hooks = pre;
                if let Some(by) = &report.pre_event_stopped_by {
                    debug!(plugin = %by, kind = %event.kind(), "Event handling stopped in preEvent");
                } else {
                    let handlers = self.broadcast(&Hook::Event(event.kind()), Some(event))?;
                    report.hooks.absorb(handlers);
                }
            }
        }
        let pre_dispatch = self.broadcast(&Hook::PreDispatch, phase.event())?;
        report.hooks.absorb(pre_dispatch);
        Ok(report)
    }

    fn finish(&mut self, phase: &Phase, report: &mut PassReport) -> PluginResult<()> {
        let post = self.broadcast(&Hook::PostDispatch, phase.event())?;
        report.hooks.absorb(post);
        if !self.queue.is_empty() {
            debug!(carried = self.queue.len(), "Events queued after dispatch");
        }
        Ok(())
    }

    fn broadcast(&mut self, hook: &Hook, event: Option<&Event>) -> PluginResult<BroadcastReport> {
        let settings = self.plugins.settings();
        let connection = self.plugins.connection();
        let mut ctx = context(&settings, connection.as_deref(), &mut self.queue, event);
        self.plugins.broadcast(&mut ctx, hook, &[], Some(&self.filter))
    }

    /// Drains the queue without running any hooks.
    pub fn drain(&mut self) -> Vec<OutgoingEvent> {
        self.queue.take()
    }
}

fn context<'a>(
    settings: &'a Settings,
    connection: Option<&'a Connection>,
    queue: &'a mut EventQueue,
    event: Option<&'a Event>,
) -> Context<'a> {
    let mut ctx = Context::new(DISPATCHER)
        .with_config(settings)
        .with_events(queue);
    if let Some(connection) = connection {
        ctx = ctx.with_connection(connection);
    }
    if let Some(event) = event {
        ctx = ctx.with_event(event);
    }
    ctx
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use brass_core::{ChannelTransport, EventKind, Hostmask};
    use brass_framework::{
        Capabilities, CommandRouter, CommandSpec, Flow, HookResult, Plugin, PluginCatalog,
        PluginError, Prioritize,
    };
    use parking_lot::Mutex;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Emits fixed events from `onPrivmsg` and records every hook it sees.
    struct Chatter {
        log: Log,
        emit: Vec<EventKind>,
    }

    impl Plugin for Chatter {
        fn name(&self) -> &str {
            "Chatter"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new()
                .hook(Hook::Tick)
                .hook(Hook::PreDispatch)
                .hook(Hook::PostDispatch)
                .event(EventKind::Privmsg)
        }

        fn on_tick(&mut self, _ctx: &mut Context<'_>) -> HookResult {
            self.log.lock().push("tick".into());
            Ok(Flow::Continue)
        }

        fn on_event(&mut self, ctx: &mut Context<'_>) -> HookResult {
            self.log.lock().push("privmsg".into());
            for kind in &self.emit {
                ctx.emit(*kind, ["#brass"])?;
            }
            Ok(Flow::Continue)
        }

        fn pre_dispatch(&mut self, _ctx: &mut Context<'_>) -> HookResult {
            self.log.lock().push("preDispatch".into());
            Ok(Flow::Continue)
        }

        fn post_dispatch(&mut self, ctx: &mut Context<'_>) -> HookResult {
            self.log.lock().push("postDispatch".into());
            if ctx.event().is_ok() {
                ctx.notice("#brass", "after")?;
            }
            Ok(Flow::Continue)
        }
    }

    struct Gate;

    impl Plugin for Gate {
        fn name(&self) -> &str {
            "Gate"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new().hook(Hook::PreEvent)
        }

        fn pre_event(&mut self, ctx: &mut Context<'_>) -> HookResult {
            let ignored = ctx.event()?.nick() == Some("spammer");
            Ok(if ignored { Flow::Stop } else { Flow::Continue })
        }
    }

    fn message(nick: &str) -> Event {
        Event::privmsg(Hostmask::new(nick, "u", "host"), "#brass", "hi")
    }

    fn dispatch(emit: Vec<EventKind>) -> (DispatchLoop, Log) {
        let log = Log::default();
        let mut plugins = PluginHandler::new(PluginCatalog::new());
        plugins.add_instance(Box::new(Gate)).unwrap();
        plugins
            .add_instance(Box::new(Chatter {
                log: log.clone(),
                emit,
            }))
            .unwrap();
        plugins.add_instance(Box::new(Prioritize::new())).unwrap();
        (DispatchLoop::new(plugins), log)
    }

    fn kinds(batch: &[OutgoingEvent]) -> Vec<EventKind> {
        batch.iter().map(OutgoingEvent::kind).collect()
    }

    #[tokio::test]
    async fn test_pass_sends_in_precedence_order() {
        let (mut dispatch, log) = dispatch(vec![EventKind::Quit, EventKind::Privmsg, EventKind::Join]);
        let (mut transport, mut peer) = ChannelTransport::pair(8);

        let report = dispatch
            .run_pass(&mut transport, Phase::Event(message("alice")))
            .await
            .unwrap();

        assert_eq!(report.sent, 3);
        let batch = peer.outgoing.recv().await.unwrap();
        assert_eq!(
            kinds(&batch),
            [EventKind::Join, EventKind::Privmsg, EventKind::Quit]
        );
        assert!(batch.iter().all(|e| e.source() == "Chatter"));
        assert_eq!(*log.lock(), ["privmsg", "preDispatch", "postDispatch"]);
    }

    #[tokio::test]
    async fn test_pre_event_stop_skips_handlers_only() {
        let (mut dispatch, log) = dispatch(vec![EventKind::Privmsg]);
        let (mut transport, _peer) = ChannelTransport::pair(8);

        let report = dispatch
            .run_pass(&mut transport, Phase::Event(message("spammer")))
            .await
            .unwrap();

        assert_eq!(report.pre_event_stopped_by.as_deref(), Some("Gate"));
        assert_eq!(report.sent, 0);
        assert_eq!(*log.lock(), ["preDispatch", "postDispatch"]);
    }

    #[tokio::test]
    async fn test_post_dispatch_emissions_carry_over() {
        let (mut dispatch, log) = dispatch(vec![]);
        let (mut transport, mut peer) = ChannelTransport::pair(8);

        dispatch
            .run_pass(&mut transport, Phase::Event(message("alice")))
            .await
            .unwrap();
        assert_eq!(dispatch.queue().len(), 1);

        let report = dispatch.run_pass(&mut transport, Phase::Tick).await.unwrap();
        assert_eq!(report.sent, 1);
        let batch = peer.outgoing.recv().await.unwrap();
        assert_eq!(kinds(&batch), [EventKind::Notice]);
        assert!(dispatch.queue().is_empty());
        assert_eq!(log.lock().last().map(String::as_str), Some("postDispatch"));
    }

    #[tokio::test]
    async fn test_filter_excludes_plugins_from_pass() {
        let (mut dispatch, log) = dispatch(vec![EventKind::Privmsg]);
        dispatch.filter_mut().exclude_plugins(["Chatter"]);
        let (mut transport, _peer) = ChannelTransport::pair(8);

        let report = dispatch
            .run_pass(&mut transport, Phase::Event(message("alice")))
            .await
            .unwrap();

        assert_eq!(report.sent, 0);
        assert!(log.lock().is_empty());
        assert_eq!(report.hooks.invoked(), ["Gate", "Prioritize"]);
    }

    struct Roll;

    impl Plugin for Roll {
        fn name(&self) -> &str {
            "Roll"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new().command(CommandSpec::new("hi"))
        }

        fn on_command(&mut self, _: &mut Context<'_>, _: &str, _: &[String]) -> HookResult {
            Err(PluginError::hook("no dice"))
        }
    }

    #[tokio::test]
    async fn test_command_failures_appear_in_pass_report() {
        let mut plugins = PluginHandler::new(PluginCatalog::new());
        plugins.add_instance(Box::new(CommandRouter::new())).unwrap();
        plugins.add_instance(Box::new(Roll)).unwrap();
        let mut dispatch = DispatchLoop::new(plugins);
        let (mut transport, _peer) = ChannelTransport::pair(8);

        let report = dispatch
            .run_pass(&mut transport, Phase::Event(message("alice")))
            .await
            .unwrap();

        let failed: Vec<&str> = report.hooks.failures().iter().map(|f| f.plugin.as_str()).collect();
        assert_eq!(failed, ["Roll"]);
    }
}
