use std::any::Any;
use std::fmt;
use std::str::FromStr;

use brass_core::EventKind;

use super::context::Context;
use crate::error::{PluginError, PluginResult};

/// Plugin contract version implemented by this host.
///
/// Encoded as `(major << 16) | minor`.  The registry refuses instances whose
/// [`Plugin::api_version`] has a different major version.
pub const BRASS_PLUGIN_API_VERSION: u32 = 1 << 16;

/// Returns `true` if an instance built against `version` may be loaded.
pub const fn is_compatible(version: u32) -> bool {
    version >> 16 == BRASS_PLUGIN_API_VERSION >> 16
}

// ─── Flow ─────────────────────────────────────────────────────────────────────

/// What a hook wants the current broadcast to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Keep invoking the remaining plugins.
    #[default]
    Continue,
    /// Skip the remaining plugins for this hook invocation.
    Stop,
}

/// Result type returned by every hook except `on_load`.
pub type HookResult = PluginResult<Flow>;

// ─── Hook ─────────────────────────────────────────────────────────────────────

/// A broadcastable hook.
///
/// Hooks render to their conventional names (`onTick`, `preEvent`,
/// `onPrivmsg`, `onCommandRoll`, ...) and parse back from them, which is how
/// [`PluginHandler::broadcast_named`](crate::PluginHandler::broadcast_named)
/// resolves a hook given as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hook {
    /// The transport finished connecting.
    Connect,
    /// One loop tick elapsed.
    Tick,
    /// Before any per-kind handler runs for an inbound event.
    PreEvent,
    /// Per-kind handler for an inbound event.
    Event(EventKind),
    /// A chat command; holds the lowercase command word.
    Command(String),
    /// Before the outgoing queue is handed to the transport.
    PreDispatch,
    /// After the outgoing queue was handed to the transport.
    PostDispatch,
}

impl Hook {
    /// Prefix shared by every command handler name.
    pub const COMMAND_PREFIX: &'static str = "onCommand";

    /// Builds the command hook for a word, normalising its case.
    pub fn command(word: &str) -> Self {
        Self::Command(word.to_lowercase())
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Connect => f.write_str("onConnect"),
            Hook::Tick => f.write_str("onTick"),
            Hook::PreEvent => f.write_str("preEvent"),
            Hook::Event(kind) => write!(f, "on{}", kind.title()),
            Hook::Command(word) => write!(f, "{}", command_handler_name(word)),
            Hook::PreDispatch => f.write_str("preDispatch"),
            Hook::PostDispatch => f.write_str("postDispatch"),
        }
    }
}

impl FromStr for Hook {
    type Err = PluginError;

    /// Parses a conventional hook name.  Matching is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "onconnect" => return Ok(Hook::Connect),
            "ontick" => return Ok(Hook::Tick),
            "preevent" => return Ok(Hook::PreEvent),
            "predispatch" => return Ok(Hook::PreDispatch),
            "postdispatch" => return Ok(Hook::PostDispatch),
            _ => {}
        }
        if let Some(word) = lower.strip_prefix("oncommand")
            && !word.is_empty()
        {
            return Ok(Hook::Command(word.to_string()));
        }
        match lower.strip_prefix("on") {
            Some(kind) => kind
                .parse::<EventKind>()
                .map(Hook::Event)
                .map_err(|_| PluginError::InvalidCall(s.to_string())),
            None => Err(PluginError::InvalidCall(s.to_string())),
        }
    }
}

/// Derives the handler name for a command word: `roll` → `onCommandRoll`.
pub fn command_handler_name(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => format!(
            "{}{}{}",
            Hook::COMMAND_PREFIX,
            first.to_uppercase(),
            chars.as_str()
        ),
        None => Hook::COMMAND_PREFIX.to_string(),
    }
}

// ─── CommandSpec ──────────────────────────────────────────────────────────────

/// Declares one chat command handler and its arity.
///
/// ```rust,ignore
/// // onCommandRoll(dice, modifier = None)
/// CommandSpec::new("roll").required(1).optional(1)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    word: String,
    required: usize,
    optional: usize,
}

impl CommandSpec {
    /// A command taking no parameters.
    pub fn new(word: impl AsRef<str>) -> Self {
        Self {
            word: word.as_ref().to_lowercase(),
            required: 0,
            optional: 0,
        }
    }

    /// Sets the number of required parameters.
    pub fn required(mut self, count: usize) -> Self {
        self.required = count;
        self
    }

    /// Sets the number of optional parameters following the required ones.
    pub fn optional(mut self, count: usize) -> Self {
        self.optional = count;
        self
    }

    /// Lowercase command word.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Derived handler name, e.g. `onCommandRoll`.
    pub fn handler_name(&self) -> String {
        command_handler_name(&self.word)
    }

    pub fn required_params(&self) -> usize {
        self.required
    }

    pub fn total_params(&self) -> usize {
        self.required + self.optional
    }
}

// ─── Capabilities ─────────────────────────────────────────────────────────────

/// The explicit hook table of a plugin.
///
/// Captured once when the plugin is registered.  A plugin only receives the
/// hooks it declares here; `on_load` is always called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    hooks: Vec<Hook>,
    commands: Vec<CommandSpec>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a lifecycle or per-event hook.
    pub fn hook(mut self, hook: Hook) -> Self {
        if let Hook::Command(word) = &hook {
            return self.command(CommandSpec::new(word));
        }
        if !self.hooks.contains(&hook) {
            self.hooks.push(hook);
        }
        self
    }

    /// Shorthand for `hook(Hook::Event(kind))`.
    pub fn event(self, kind: EventKind) -> Self {
        self.hook(Hook::Event(kind))
    }

    /// Declares a chat command handler.
    pub fn command(mut self, spec: CommandSpec) -> Self {
        match self.commands.iter_mut().find(|c| c.word == spec.word) {
            Some(existing) => *existing = spec,
            None => self.commands.push(spec),
        }
        self
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Returns `true` if the plugin receives `hook`.
    pub fn implements(&self, hook: &Hook) -> bool {
        match hook {
            Hook::Command(word) => self.commands.iter().any(|c| &c.word == word),
            other => self.hooks.contains(other),
        }
    }
}

// ─── Plugin trait ─────────────────────────────────────────────────────────────

/// Upcasting helper so plugin handles can be downcast to concrete types.
///
/// Blanket-implemented for every `'static` type; plugins never implement it.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The capability interface every extension unit implements.
///
/// Every hook has a no-op default, so a plugin implements only what it
/// declares in [`capabilities`](Self::capabilities).  Hooks are synchronous
/// and run on the dispatch loop: a hook that blocks stalls the whole bot, so
/// long work belongs on a spawned task whose result comes back on a later
/// tick.
///
/// # Example
///
/// ```rust,ignore
/// struct Dice;
///
/// impl Plugin for Dice {
///     fn name(&self) -> &str { "Dice" }
///
///     fn capabilities(&self) -> Capabilities {
///         Capabilities::new().command(CommandSpec::new("roll").required(1))
///     }
///
///     fn on_command(&mut self, ctx: &mut Context<'_>, _: &str, args: &[String]) -> HookResult {
///         let target = ctx.event()?.reply_target().unwrap_or_default().to_string();
///         ctx.privmsg(&target, &format!("rolled {}", args[0]))?;
///         Ok(Flow::Continue)
///     }
/// }
/// ```
pub trait Plugin: AsAny + Send {
    /// Short name this plugin is registered under.
    fn name(&self) -> &str;

    /// Contract version this plugin was built against.
    fn api_version(&self) -> u32 {
        BRASS_PLUGIN_API_VERSION
    }

    /// Hooks and commands this plugin handles.
    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
    }

    /// Called once right after the plugin is stored in the registry.
    ///
    /// May request other plugins through `ctx.plugins()`.  Returning
    /// `Err(ctx.fail(..))` aborts the registration.
    fn on_load(&mut self, _ctx: &mut Context<'_>) -> PluginResult<()> {
        Ok(())
    }

    fn on_connect(&mut self, _ctx: &mut Context<'_>) -> HookResult {
        Ok(Flow::Continue)
    }

    fn on_tick(&mut self, _ctx: &mut Context<'_>) -> HookResult {
        Ok(Flow::Continue)
    }

    /// Returning [`Flow::Stop`] skips the remaining `pre_event` hooks and the
    /// per-kind handlers for the current event.
    fn pre_event(&mut self, _ctx: &mut Context<'_>) -> HookResult {
        Ok(Flow::Continue)
    }

    /// Per-kind handler; `ctx.event()` holds the inbound event.
    fn on_event(&mut self, _ctx: &mut Context<'_>) -> HookResult {
        Ok(Flow::Continue)
    }

    /// Chat command handler; `command` is the lowercase command word.
    fn on_command(
        &mut self,
        _ctx: &mut Context<'_>,
        _command: &str,
        _args: &[String],
    ) -> HookResult {
        Ok(Flow::Continue)
    }

    fn pre_dispatch(&mut self, _ctx: &mut Context<'_>) -> HookResult {
        Ok(Flow::Continue)
    }

    fn post_dispatch(&mut self, _ctx: &mut Context<'_>) -> HookResult {
        Ok(Flow::Continue)
    }
}

/// Invokes `hook` on `plugin`.
pub(crate) fn invoke(
    plugin: &mut dyn Plugin,
    ctx: &mut Context<'_>,
    hook: &Hook,
    args: &[String],
) -> HookResult {
    match hook {
        Hook::Connect => plugin.on_connect(ctx),
        Hook::Tick => plugin.on_tick(ctx),
        Hook::PreEvent => plugin.pre_event(ctx),
        Hook::Event(_) => plugin.on_event(ctx),
        Hook::Command(word) => plugin.on_command(ctx, word, args),
        Hook::PreDispatch => plugin.pre_dispatch(ctx),
        Hook::PostDispatch => plugin.post_dispatch(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_names_round_trip() {
        let hooks = [
            Hook::Connect,
            Hook::Tick,
            Hook::PreEvent,
            Hook::Event(EventKind::Privmsg),
            Hook::Command("roll".into()),
            Hook::PreDispatch,
            Hook::PostDispatch,
        ];
        for hook in hooks {
            assert_eq!(hook.to_string().parse::<Hook>().unwrap(), hook);
        }
        assert_eq!(Hook::Event(EventKind::Join).to_string(), "onJoin");
        assert_eq!(Hook::command("ROLL").to_string(), "onCommandRoll");
    }

    #[test]
    fn test_hook_parse_rejects_unknown() {
        for name in ["doPrivmsg", "onFrobnicate", "onCommand", "tick", ""] {
            let err = name.parse::<Hook>().unwrap_err();
            assert!(matches!(err, PluginError::InvalidCall(_)), "{name}");
        }
    }

    #[test]
    fn test_command_handler_name() {
        assert_eq!(command_handler_name("roll"), "onCommandRoll");
        assert_eq!(command_handler_name("ROLL"), "onCommandRoll");
        assert_eq!(command_handler_name("w"), "onCommandW");
    }

    #[test]
    fn test_command_spec_arity() {
        let spec = CommandSpec::new("Roll").required(1).optional(2);
        assert_eq!(spec.word(), "roll");
        assert_eq!(spec.required_params(), 1);
        assert_eq!(spec.total_params(), 3);
        assert_eq!(spec.handler_name(), "onCommandRoll");
    }

    #[test]
    fn test_capabilities_implements() {
        let caps = Capabilities::new()
            .hook(Hook::Tick)
            .event(EventKind::Privmsg)
            .hook(Hook::command("roll"))
            .command(CommandSpec::new("roll").required(1));

        assert!(caps.implements(&Hook::Tick));
        assert!(caps.implements(&Hook::Event(EventKind::Privmsg)));
        assert!(!caps.implements(&Hook::Event(EventKind::Join)));
        assert!(caps.implements(&Hook::command("roll")));
        assert_eq!(caps.commands().len(), 1);
        assert_eq!(caps.commands()[0].required_params(), 1);
    }

    #[test]
    fn test_api_compatibility() {
        assert!(is_compatible(BRASS_PLUGIN_API_VERSION));
        assert!(is_compatible(BRASS_PLUGIN_API_VERSION | 3));
        assert!(!is_compatible(2 << 16));
    }
}
