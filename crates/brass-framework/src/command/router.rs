use brass_core::EventKind;
use tracing::debug;

use super::cache::CommandMethodCache;
use super::split::{command_body, split_command, split_params};
use crate::plugin::{Capabilities, Context, Flow, Hook, HookResult, Plugin, command_handler_name};

/// Setting holding the command prefix (e.g. `"!"`).
pub const PREFIX_SETTING: &str = "command.prefix";

/// Built-in plugin routing chat lines to command handlers.
///
/// Listens for `privmsg`, recognises `[prefix]word [args...]`, and broadcasts
/// [`Hook::Command`] to every plugin declaring `word`, provided the arguments
/// satisfy the declared arity.  Lines that are not commands are ignored.
#[derive(Debug, Default)]
pub struct CommandRouter {
    cache: CommandMethodCache,
}

impl CommandRouter {
    pub const NAME: &'static str = "Command";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &CommandMethodCache {
        &self.cache
    }
}

impl Plugin for CommandRouter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new().event(EventKind::Privmsg)
    }

    fn on_event(&mut self, ctx: &mut Context<'_>) -> HookResult {
        let event = ctx.event()?;
        let Some(text) = event.text() else {
            return Ok(Flow::Continue);
        };

        if self.cache.is_empty() {
            self.cache.populate(ctx.plugins()?.iter());
        }

        let prefix = ctx.config().ok().and_then(|c| c.get_str(PREFIX_SETTING));
        let nick = ctx.connection().ok().map(|c| c.nick.as_str());
        let Some(body) = command_body(text, prefix, nick, event.is_in_channel()) else {
            debug!(text, "Prefix missing; not a command");
            return Ok(Flow::Continue);
        };
        let Some((word, remainder)) = split_command(body) else {
            return Ok(Flow::Continue);
        };

        let handler = command_handler_name(word);
        let Some(arity) = self.cache.get(&handler) else {
            debug!(%handler, "No plugin handles this command");
            return Ok(Flow::Continue);
        };

        let args = split_params(remainder, arity.total);
        if args.len() < arity.required {
            debug!(
                %handler,
                given = args.len(),
                required = arity.required,
                "Too few command arguments"
            );
            return Ok(Flow::Continue);
        }

        ctx.broadcast(&Hook::command(word), &args)?;
        Ok(Flow::Continue)
    }
}
