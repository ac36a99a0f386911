//! Configuration validation.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, BrassConfig, LogOutput, LoggingConfig, PluginsConfig};

/// Checks a merged configuration before the runtime starts from it.
pub fn validate_config(config: &BrassConfig) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_bot(&config.bot)?;
    validate_plugins(&config.plugins)?;
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    if let Some(target) = logging.filters.keys().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Empty log filter target: {target:?}"
        )));
    }
    Ok(())
}

fn validate_bot(bot: &BotConfig) -> ConfigResult<()> {
    if bot.tick_interval_ms == 0 {
        return Err(ConfigError::validation(
            "bot.tick_interval_ms must be greater than 0",
        ));
    }

    let connection = &bot.connection;
    if connection.nick.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.connection.nick"));
    }
    if connection.nick.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Nick must not contain whitespace: {:?}",
            connection.nick
        )));
    }
    if connection.host.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.connection.host"));
    }
    if connection.port == 0 {
        return Err(ConfigError::InvalidPort(connection.port));
    }
    Ok(())
}

fn validate_plugins(plugins: &PluginsConfig) -> ConfigResult<()> {
    if plugins.manifest_extension.trim_start_matches('.').is_empty() {
        return Err(ConfigError::missing_field("plugins.manifest_extension"));
    }

    for path in &plugins.paths {
        if path.prefix.is_empty() {
            return Err(ConfigError::missing_field("plugins.paths.prefix"));
        }
        if path.dir.as_ref().is_some_and(|dir| dir.as_os_str().is_empty()) {
            return Err(ConfigError::validation(format!(
                "Empty plugin directory for prefix {:?}",
                path.prefix
            )));
        }
    }

    let mut seen = HashSet::new();
    for entry in &plugins.load {
        let name = entry.name();
        if name.trim().is_empty() {
            return Err(ConfigError::missing_field("plugins.load.name"));
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicatePlugin(name.to_string()));
        }
    }
    Ok(())
}
