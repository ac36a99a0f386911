//! Configuration schema definitions.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [bot]
//! tick_interval_ms = 500
//!
//! [bot.connection]
//! host = "irc.libera.chat"
//! nick = "brass"
//!
//! [plugins]
//! autoload = true
//! paths = [{ dir = "./plugins", prefix = "mybot::plugin::" }]
//! load = ["Command", "Prioritize", { name = "Dice", args = [6] }]
//! exclude = ["Cron"]
//!
//! [settings.command]
//! prefix = "!"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use brass_core::Connection;
use brass_framework::{PluginEntry, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrassConfig {
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Loop timing and the connection identity.
    #[serde(default)]
    pub bot: BotConfig,

    /// Which plugins are loaded and where they are found.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Free-form settings handed to plugins through `ctx.config()`.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl BrassConfig {
    /// The `settings` section as a plugin-facing [`Settings`] lookup.
    pub fn plugin_settings(&self) -> Settings {
        Settings::from(self.settings.clone())
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Written to [`LoggingConfig::file_path`].
    File,
}

/// Rotation schedule of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in each line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file used with `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-module level overrides, e.g. `brass_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::default(),
            filters: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Bot
// =============================================================================

/// Loop timing and connection identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Interval between `onTick` passes, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub connection: Connection,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            connection: Connection::default(),
        }
    }
}

impl BotConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

// =============================================================================
// Plugins
// =============================================================================

/// One plugin search location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginPathConfig {
    /// Directory holding `<ShortName>.<ext>` manifests.  Without one, the
    /// prefix alone resolves classes registered in the catalog.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Class name prefix, e.g. `mybot::plugin::`.
    pub prefix: String,
}

/// A `plugins.load` entry: a bare name or a name with constructor arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginLoadConfig {
    Name(String),
    WithArgs {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl PluginLoadConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithArgs { name, .. } => name,
        }
    }
}

impl From<&PluginLoadConfig> for PluginEntry {
    fn from(entry: &PluginLoadConfig) -> Self {
        match entry {
            PluginLoadConfig::Name(name) => PluginEntry::Name(name.clone()),
            PluginLoadConfig::WithArgs { name, args } => {
                PluginEntry::WithArgs(name.clone(), args.clone())
            }
        }
    }
}

/// Plugin loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Load plugins on first request instead of failing.
    #[serde(default)]
    pub autoload: bool,

    /// Extra search paths, searched last-first after the built-in one.
    #[serde(default)]
    pub paths: Vec<PluginPathConfig>,

    /// Extension of manifest files.
    #[serde(default = "default_manifest_extension")]
    pub manifest_extension: String,

    /// Plugins loaded at startup, in order.
    #[serde(default = "default_load")]
    pub load: Vec<PluginLoadConfig>,

    /// Loaded plugins left out of event dispatch.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            autoload: false,
            paths: Vec::new(),
            manifest_extension: default_manifest_extension(),
            load: default_load(),
            exclude: Vec::new(),
        }
    }
}

fn default_manifest_extension() -> String {
    brass_framework::handler::DEFAULT_MANIFEST_EXTENSION.to_string()
}

fn default_load() -> Vec<PluginLoadConfig> {
    ["Command", "Prioritize", "Cron"]
        .into_iter()
        .map(|name| PluginLoadConfig::Name(name.to_string()))
        .collect()
}
