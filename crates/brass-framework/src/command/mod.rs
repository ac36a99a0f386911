//! Chat command routing.
//!
//! A plugin declares the commands it handles in its [`Capabilities`](crate::plugin::Capabilities):
//!
//! ```rust,ignore
//! Capabilities::new().command(CommandSpec::new("roll").required(1).optional(1))
//! ```
//!
//! The built-in [`CommandRouter`] plugin (registered as `Command`) watches
//! `privmsg` events.  For a line such as `!roll 3d6 +2` it:
//!
//! 1. strips the `command.prefix` setting (or the bot's nick, when addressed
//!    as `brass: roll 3d6`),
//! 2. derives the handler name `onCommandRoll` from the first word,
//! 3. looks up the handler's arity in the [`CommandMethodCache`],
//! 4. splits the remainder into at most `required + optional` tokens, the last
//!    one keeping any inner whitespace,
//! 5. broadcasts `Hook::Command("roll")` with those tokens to every plugin
//!    declaring `roll`, if at least `required` tokens were given.
//!
//! Anything that does not fit is silently ignored.

pub mod cache;
pub mod router;
pub mod split;

pub use cache::{Arity, CommandMethodCache};
pub use router::{CommandRouter, PREFIX_SETTING};
pub use split::{command_body, split_command, split_params};
