//! Configuration for the Brass runtime.
//!
//! Configuration is merged by [`ConfigLoader`] from defaults, files and
//! `BRASS_*` environment variables, then checked by [`validate_config`].
//!
//! | Section    | Purpose                                         |
//! |------------|-------------------------------------------------|
//! | `logging`  | Level, format and destination of log output     |
//! | `bot`      | Tick interval and connection identity           |
//! | `plugins`  | Search paths, startup plugins, dispatch filter  |
//! | `settings` | Free-form values read by plugins                |

mod error;
mod loader;
mod schema;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, PROFILE_ENV, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, BrassConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PluginLoadConfig,
    PluginPathConfig, PluginsConfig, SpanEventConfig,
};
pub use validation::validate_config;
