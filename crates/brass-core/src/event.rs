//! Inbound event model for the Brass framework.
//!
//! This module provides the types a transport produces and the dispatch core
//! consumes:
//!
//! - [`EventKind`] - Closed taxonomy of protocol event kinds
//! - [`Hostmask`] - The `nick!user@host` identity an event originates from
//! - [`Event`] - One inbound protocol event (kind + ordered arguments + origin)
//!
//! Wire parsing is not part of this crate; transports build [`Event`]s from
//! whatever codec they use and hand them to the runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownEventKind;

// ============================================================================
// Event Kind Taxonomy
// ============================================================================

macro_rules! event_kinds {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)+) => {
        /// Classification of protocol events, shared by inbound and outgoing events.
        ///
        /// Kinds render to and parse from their lowercase protocol names
        /// (`"privmsg"`, `"join"`, ...).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum EventKind {
            $($(#[$meta])* $variant,)+
        }

        impl EventKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [EventKind] = &[$(EventKind::$variant,)+];

            /// Returns the lowercase protocol name of this kind.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(EventKind::$variant => $name,)+
                }
            }
        }

        impl FromStr for EventKind {
            type Err = UnknownEventKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok(EventKind::$variant),)+
                    _ => Err(UnknownEventKind(s.to_string())),
                }
            }
        }
    };
}

event_kinds! {
    /// A raw protocol line passed through untouched.
    Raw => "raw",
    Pass => "pass",
    User => "user",
    Nick => "nick",
    Join => "join",
    Part => "part",
    Quit => "quit",
    Privmsg => "privmsg",
    Notice => "notice",
    /// A CTCP ACTION (`/me`) message.
    Action => "action",
    /// A CTCP request other than ACTION.
    Ctcp => "ctcp",
    Ping => "ping",
    Pong => "pong",
    Mode => "mode",
    Topic => "topic",
    Names => "names",
    List => "list",
    Invite => "invite",
    Kick => "kick",
    Kill => "kill",
    Version => "version",
    Stats => "stats",
    Links => "links",
    Time => "time",
    Trace => "trace",
    Admin => "admin",
    Info => "info",
    Who => "who",
    Whois => "whois",
    Whowas => "whowas",
    Away => "away",
    /// A numeric server reply.
    Response => "response",
    Error => "error",
}

impl EventKind {
    /// Returns the name with its first letter uppercased (`"Privmsg"`).
    ///
    /// Used to build hook and emission names such as `onPrivmsg` or `doJoin`.
    pub fn title(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Hostmask
// ============================================================================

/// The `nick!user@host` identity an inbound event originates from.
///
/// Server-originated events may only carry a host; in that case `nick` holds
/// the server name and `user`/`host` are empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hostmask {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl Hostmask {
    /// Creates a hostmask from its parts.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }
}

impl FromStr for Hostmask {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (nick, rest) = s.split_once('!').unwrap_or((s, ""));
        let (user, host) = rest.split_once('@').unwrap_or((rest, ""));
        Ok(Self::new(nick, user, host))
    }
}

impl fmt::Display for Hostmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user.is_empty() && self.host.is_empty() {
            return f.write_str(&self.nick);
        }
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

// ============================================================================
// Event
// ============================================================================

/// One inbound protocol event.
///
/// Arguments are kept in protocol order. For message-like kinds
/// (`privmsg`, `notice`, `action`) the first argument is the target and the
/// last one is the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    kind: EventKind,
    args: Vec<String>,
    source: Option<Hostmask>,
    raw: Option<String>,
}

impl Event {
    /// Creates an event with no origin.
    pub fn new<I, S>(kind: EventKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
            source: None,
            raw: None,
        }
    }

    /// Shorthand for a `privmsg` from `source` to `target`.
    pub fn privmsg(source: Hostmask, target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(EventKind::Privmsg, [target.into(), text.into()]).with_source(source)
    }

    /// Attaches the originating identity.
    pub fn with_source(mut self, source: Hostmask) -> Self {
        self.source = Some(source);
        self
    }

    /// Attaches the raw protocol line the event was decoded from.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn source(&self) -> Option<&Hostmask> {
        self.source.as_ref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Returns the nick of the originating identity.
    pub fn nick(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.nick.as_str())
    }

    /// Returns the target (first argument) of message-like events.
    pub fn target(&self) -> Option<&str> {
        match self.kind {
            EventKind::Privmsg | EventKind::Notice | EventKind::Action | EventKind::Ctcp => {
                self.arg(0)
            }
            _ => None,
        }
    }

    /// Returns the text of message-like events.
    ///
    /// For non-message events, returns `None`.
    pub fn text(&self) -> Option<&str> {
        match self.kind {
            EventKind::Privmsg | EventKind::Notice | EventKind::Action => {
                self.args.last().filter(|_| self.args.len() > 1).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Returns `true` when the event was sent to a channel (group context).
    pub fn is_in_channel(&self) -> bool {
        self.target()
            .and_then(|t| t.chars().next())
            .is_some_and(|c| matches!(c, '#' | '&' | '+' | '!'))
    }

    /// Returns where a reply to this event should go: the channel when the
    /// event was sent to one, otherwise the sender's nick.
    pub fn reply_target(&self) -> Option<&str> {
        if self.is_in_channel() {
            self.target()
        } else {
            self.nick()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Hostmask {
        "alice!al@example.org".parse().unwrap()
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), *kind);
        }
        assert_eq!("PRIVMSG".parse::<EventKind>().unwrap(), EventKind::Privmsg);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = "frobnicate".parse::<EventKind>().unwrap_err();
        assert_eq!(err.0, "frobnicate");
    }

    #[test]
    fn test_kind_title() {
        assert_eq!(EventKind::Privmsg.title(), "Privmsg");
        assert_eq!(EventKind::Join.title(), "Join");
    }

    #[test]
    fn test_hostmask_parse_and_display() {
        let mask = alice();
        assert_eq!(mask.nick, "alice");
        assert_eq!(mask.user, "al");
        assert_eq!(mask.host, "example.org");
        assert_eq!(mask.to_string(), "alice!al@example.org");

        let server: Hostmask = "irc.example.org".parse().unwrap();
        assert_eq!(server.to_string(), "irc.example.org");
    }

    #[test]
    fn test_channel_message() {
        let event = Event::privmsg(alice(), "#rust", "hello");
        assert!(event.is_in_channel());
        assert_eq!(event.text(), Some("hello"));
        assert_eq!(event.reply_target(), Some("#rust"));
    }

    #[test]
    fn test_private_message_replies_to_sender() {
        let event = Event::privmsg(alice(), "brass", "hello");
        assert!(!event.is_in_channel());
        assert_eq!(event.reply_target(), Some("alice"));
    }

    #[test]
    fn test_text_absent_for_non_message() {
        let event = Event::new(EventKind::Join, ["#rust"]);
        assert_eq!(event.text(), None);
        assert_eq!(event.target(), None);
        assert!(!event.is_in_channel());
    }
}
