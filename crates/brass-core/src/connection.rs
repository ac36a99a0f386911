//! Identity of the active server connection.

use serde::{Deserialize, Serialize};

/// The server the bot is connected to and the identity it uses there.
///
/// Socket handling belongs to the transport; the dispatch core only needs to
/// know who "we" are, e.g. to recognise messages addressed to the bot's nick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Server host name.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Nick the bot is registered with.
    #[serde(default = "default_nick")]
    pub nick: String,

    /// Username sent during registration.
    #[serde(default = "default_nick")]
    pub username: String,

    /// Real name sent during registration.
    #[serde(default = "default_realname")]
    pub realname: String,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            nick: default_nick(),
            username: default_nick(),
            realname: default_realname(),
        }
    }
}

impl Connection {
    /// Creates a connection description with default ports and names.
    pub fn new(host: impl Into<String>, nick: impl Into<String>) -> Self {
        let nick = nick.into();
        Self {
            host: host.into(),
            username: nick.clone(),
            nick,
            ..Self::default()
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6667
}

fn default_nick() -> String {
    "brass".to_string()
}

fn default_realname() -> String {
    "Brass bot".to_string()
}
