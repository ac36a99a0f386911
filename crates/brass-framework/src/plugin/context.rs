//! Per-call context handed to every plugin hook.
//!
//! A [`Context`] replaces long-lived back-references from plugins to the
//! registry, the outgoing queue, the connection and the current event.  The
//! dispatch loop builds one per pass and re-scopes it for each plugin, so a
//! plugin only ever borrows the shared state for the duration of one hook:
//!
//! - `config`: the [`Settings`] lookup
//! - `plugins`: the [`PluginHandler`] (mutable: plugins may load others)
//! - `events`: the outgoing [`EventQueue`] (mutable: emission appends here)
//! - `connection`: the active [`Connection`]
//! - `event`: the inbound [`Event`] being dispatched
//!
//! Each part is optional.  Setting it is fluent (`with_*`); reading a part
//! that was never set fails with the matching "not yet set" error.

use brass_core::{Connection, Event, EventKind, EventQueue};

use super::contract::Hook;
use crate::error::{PluginError, PluginResult};
use crate::handler::{BroadcastReport, PluginHandler};
use crate::settings::Settings;

/// Prefix marking a dynamic call as an emission (`doPrivmsg`).
pub const EMIT_PREFIX: &str = "do";

/// Borrowed view of the dispatch state for one plugin hook call.
pub struct Context<'a> {
    plugin: &'a str,
    config: Option<&'a Settings>,
    plugins: Option<&'a mut PluginHandler>,
    events: Option<&'a mut EventQueue>,
    connection: Option<&'a Connection>,
    event: Option<&'a Event>,
}

impl<'a> Context<'a> {
    /// Creates an empty context for the plugin named `plugin`.
    pub fn new(plugin: &'a str) -> Self {
        Self {
            plugin,
            config: None,
            plugins: None,
            events: None,
            connection: None,
            event: None,
        }
    }

    // ─── Fluent setters ───────────────────────────────────────────────────────

    pub fn with_config(mut self, config: &'a Settings) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_plugins(mut self, plugins: &'a mut PluginHandler) -> Self {
        self.plugins = Some(plugins);
        self
    }

    pub fn with_events(mut self, events: &'a mut EventQueue) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_connection(mut self, connection: &'a Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_event(mut self, event: &'a Event) -> Self {
        self.event = Some(event);
        self
    }

    /// Re-borrows this context for another plugin.
    pub fn scoped<'b>(&'b mut self, plugin: &'b str) -> Context<'b> {
        Context {
            plugin,
            config: self.config,
            plugins: self.plugins.as_deref_mut(),
            events: self.events.as_deref_mut(),
            connection: self.connection,
            event: self.event,
        }
    }

    // ─── Getters ──────────────────────────────────────────────────────────────

    /// Short name of the plugin this context was scoped for.
    pub fn plugin_name(&self) -> &str {
        self.plugin
    }

    pub fn config(&self) -> PluginResult<&'a Settings> {
        self.config.ok_or(PluginError::NoConfigHandler)
    }

    pub fn plugins(&mut self) -> PluginResult<&mut PluginHandler> {
        self.plugins.as_deref_mut().ok_or(PluginError::NoPluginHandler)
    }

    pub fn events(&mut self) -> PluginResult<&mut EventQueue> {
        self.events.as_deref_mut().ok_or(PluginError::NoEventHandler)
    }

    pub fn connection(&self) -> PluginResult<&'a Connection> {
        self.connection.ok_or(PluginError::NoConnection)
    }

    pub fn event(&self) -> PluginResult<&'a Event> {
        self.event.ok_or(PluginError::NoEvent)
    }

    /// Builds the error a plugin returns from `on_load` to abort its own
    /// registration.
    pub fn fail(&self, message: impl Into<String>) -> PluginError {
        PluginError::RequirementUnsatisfied {
            plugin: self.plugin.to_string(),
            message: message.into(),
        }
    }

    /// Broadcasts `hook` to the other plugins from inside a hook.
    ///
    /// The calling plugin is busy for the duration and is skipped if it
    /// declares `hook` itself.  Non-fatal failures also land in the report of
    /// the broadcast that invoked the calling hook.
    pub fn broadcast(&mut self, hook: &Hook, args: &[String]) -> PluginResult<BroadcastReport> {
        let plugins = self.plugins.take().ok_or(PluginError::NoPluginHandler)?;
        let report = plugins.broadcast(self, hook, args, None);
        if let Ok(report) = &report {
            plugins.record_nested(report.failures());
        }
        self.plugins = Some(plugins);
        report
    }

    // ─── Emission ─────────────────────────────────────────────────────────────

    /// Queues an outgoing event tagged with this plugin's name.
    ///
    /// Nothing is sent until the dispatch pass finishes.
    pub fn emit<I, S>(&mut self, kind: EventKind, args: I) -> PluginResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = self.plugin;
        self.events()?.add(source, kind, args);
        Ok(())
    }

    /// Dynamic emission by name: `doPrivmsg`, `doJoin`, ...
    ///
    /// Any name that does not carry the `do` prefix followed by a known event
    /// kind fails with [`PluginError::InvalidCall`].
    pub fn invoke(&mut self, name: &str, args: &[String]) -> PluginResult<()> {
        let kind = name
            .strip_prefix(EMIT_PREFIX)
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
            .and_then(|rest| rest.parse::<EventKind>().ok())
            .ok_or_else(|| PluginError::InvalidCall(name.to_string()))?;
        self.emit(kind, args.iter().cloned())
    }

    pub fn privmsg(&mut self, target: &str, text: &str) -> PluginResult<()> {
        self.emit(EventKind::Privmsg, [target, text])
    }

    pub fn notice(&mut self, target: &str, text: &str) -> PluginResult<()> {
        self.emit(EventKind::Notice, [target, text])
    }

    pub fn action(&mut self, target: &str, text: &str) -> PluginResult<()> {
        self.emit(EventKind::Action, [target, text])
    }

    pub fn join(&mut self, channel: &str) -> PluginResult<()> {
        self.emit(EventKind::Join, [channel])
    }

    pub fn part(&mut self, channel: &str, reason: Option<&str>) -> PluginResult<()> {
        self.emit(EventKind::Part, [Some(channel), reason].into_iter().flatten())
    }

    pub fn quit(&mut self, reason: Option<&str>) -> PluginResult<()> {
        self.emit(EventKind::Quit, reason)
    }

    pub fn nick(&mut self, nick: &str) -> PluginResult<()> {
        self.emit(EventKind::Nick, [nick])
    }

    pub fn mode(&mut self, target: &str, mode: &str) -> PluginResult<()> {
        self.emit(EventKind::Mode, [target, mode])
    }

    pub fn topic(&mut self, channel: &str, topic: &str) -> PluginResult<()> {
        self.emit(EventKind::Topic, [channel, topic])
    }

    pub fn kick(&mut self, channel: &str, nick: &str, reason: Option<&str>) -> PluginResult<()> {
        self.emit(
            EventKind::Kick,
            [Some(channel), Some(nick), reason].into_iter().flatten(),
        )
    }

    pub fn pong(&mut self, server: &str) -> PluginResult<()> {
        self.emit(EventKind::Pong, [server])
    }

    /// Queues a raw protocol line.
    pub fn raw(&mut self, line: &str) -> PluginResult<()> {
        self.emit(EventKind::Raw, [line])
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("plugin", &self.plugin)
            .field("has_config", &self.config.is_some())
            .field("has_plugins", &self.plugins.is_some())
            .field("has_events", &self.events.is_some())
            .field("connection", &self.connection)
            .field("event", &self.event)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getters_fail_before_setters() {
        let mut ctx = Context::new("Test");
        assert!(matches!(ctx.config(), Err(PluginError::NoConfigHandler)));
        assert!(matches!(ctx.plugins(), Err(PluginError::NoPluginHandler)));
        assert!(matches!(ctx.events(), Err(PluginError::NoEventHandler)));
        assert!(matches!(ctx.connection(), Err(PluginError::NoConnection)));
        assert!(matches!(ctx.event(), Err(PluginError::NoEvent)));
    }

    #[test]
    fn test_emit_tags_source() {
        let mut queue = EventQueue::new();
        let mut ctx = Context::new("Greeter").with_events(&mut queue);
        ctx.privmsg("#rust", "hi").unwrap();
        ctx.quit(None).unwrap();
        ctx.part("#rust", Some("bye")).unwrap();

        assert_eq!(queue.len(), 3);
        assert!(queue.iter().all(|e| e.source() == "Greeter"));
        assert_eq!(queue.events()[1].args(), &[] as &[String]);
        assert_eq!(queue.events()[2].args(), ["#rust", "bye"]);
    }

    #[test]
    fn test_emit_without_queue_fails() {
        let mut ctx = Context::new("Greeter");
        assert!(matches!(
            ctx.join("#rust"),
            Err(PluginError::NoEventHandler)
        ));
    }

    #[test]
    fn test_invoke_emission_convention() {
        let mut queue = EventQueue::new();
        let mut ctx = Context::new("Dyn").with_events(&mut queue);
        ctx.invoke("doJoin", &["#rust".to_string()]).unwrap();

        for bad in ["join", "doFrobnicate", "onJoin", "do", "dojoin"] {
            let err = ctx.invoke(bad, &[]).unwrap_err();
            assert!(matches!(err, PluginError::InvalidCall(_)), "{bad}");
        }
        drop(ctx);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.events()[0].kind(), EventKind::Join);
    }

    #[test]
    fn test_scoped_context_shares_queue() {
        let mut queue = EventQueue::new();
        let settings = Settings::new().with("command.prefix", "!");
        let mut ctx = Context::new("Outer")
            .with_events(&mut queue)
            .with_config(&settings);
        {
            let mut inner = ctx.scoped("Inner");
            assert_eq!(inner.config().unwrap().get_str("command.prefix"), Some("!"));
            inner.notice("#rust", "scoped").unwrap();
        }
        ctx.notice("#rust", "outer").unwrap();
        drop(ctx);
        let sources: Vec<_> = queue.iter().map(|e| e.source().to_string()).collect();
        assert_eq!(sources, vec!["Inner", "Outer"]);
    }

    #[test]
    fn test_fail_builds_requirement_error() {
        let ctx = Context::new("Needy");
        match ctx.fail("missing dependency") {
            PluginError::RequirementUnsatisfied { plugin, message } => {
                assert_eq!(plugin, "Needy");
                assert_eq!(message, "missing dependency");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
