//! Layered configuration loading on top of figment.
//!
//! Sources, lowest priority first:
//!
//! 1. [`BrassConfig::default`]
//! 2. Values passed to [`ConfigLoader::merge`]
//! 3. The profile file next to the main file (`brass.<profile>.toml`)
//! 4. The main file (`brass.toml`, `config.toml`, or the YAML equivalents)
//! 5. `BRASS_*` environment variables
//!
//! Environment keys use `__` for nesting, so `BRASS_BOT__TICK_INTERVAL_MS=250`
//! sets `bot.tick_interval_ms` and `BRASS_SETTINGS__COMMAND__PREFIX=!` sets
//! the command prefix.
//!
//! File formats follow the `toml-config` (default) and `yaml-config` features.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .search_path("/etc/brass")
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BrassConfig;
use super::validation::validate_config;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "BRASS_";

/// Variable selecting the [`Profile`].
pub const PROFILE_ENV: &str = "BRASS_PROFILE";

#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["brass.toml", "config.toml"];

#[cfg(feature = "yaml-config")]
const YAML_NAMES: &[&str] = &["brass.yaml", "brass.yml", "config.yaml", "config.yml"];

/// Deployment profile; selects the optional `brass.<profile>.<ext>` overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting `dev` and `prod` shorthands.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "production" | "prod" => Self::Production,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads [`PROFILE_ENV`], defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder collecting configuration sources.
#[derive(Debug)]
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            file: None,
            env: true,
        }
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = Profile::parse(profile);
        self
    }

    /// Adds a directory searched for the main file.  Without any, the
    /// current directory and `<config dir>/brass` are searched.
    pub fn search_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.search_paths.push(dir.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Layers `config` above the defaults and below every file.
    pub fn merge(mut self, config: BrassConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges every source and extracts the result, without validation.
    pub fn extract(self) -> ConfigResult<BrassConfig> {
        let profile = self.profile.clone();
        let config: BrassConfig = self.figment()?.extract()?;
        debug!(
            profile = %profile,
            level = %config.logging.level,
            plugins = config.plugins.load.len(),
            "Configuration merged"
        );
        Ok(config)
    }

    /// Merges every source, extracts and validates the result.
    pub fn load(self) -> ConfigResult<BrassConfig> {
        let config = self.extract()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BrassConfig::default()))
            .merge(self.overrides.clone());

        figment = match &self.file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.clone()));
                }
                info!(path = %path.display(), "Loading configuration file");
                merge_file(figment, path)?
            }
            None => self.search(figment),
        };

        if self.env {
            trace!(prefix = ENV_PREFIX, "Merging environment overrides");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        Ok(figment)
    }

    fn dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("brass")))
            .collect()
    }

    /// Merges the first main file found (and its profile overlay) for each
    /// enabled format.
    fn search(&self, mut figment: Figment) -> Figment {
        let dirs = self.dirs();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        if let Some(path) = self.find(&dirs, TOML_NAMES) {
            figment = self.merge_with_profile(figment, &path, |fig, p| fig.merge(Toml::file(p)));
            found = true;
        }

        #[cfg(feature = "yaml-config")]
        if let Some(path) = self.find(&dirs, YAML_NAMES) {
            figment = self.merge_with_profile(figment, &path, |fig, p| fig.merge(Yaml::file(p)));
            found = true;
        }

        if !found {
            warn!(searched = ?dirs, "No configuration file found, using defaults");
        }
        figment
    }

    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn find(&self, dirs: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
        dirs.iter()
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn merge_with_profile(
        &self,
        figment: Figment,
        main: &Path,
        merge: impl Fn(Figment, &Path) -> Figment,
    ) -> Figment {
        let mut figment = figment;
        if let (Some(stem), Some(ext)) = (
            main.file_stem().and_then(|s| s.to_str()),
            main.extension().and_then(|e| e.to_str()),
        ) {
            let overlay = main.with_file_name(format!("{stem}.{}.{ext}", self.profile));
            if overlay.is_file() {
                debug!(path = %overlay.display(), "Loading profile configuration");
                figment = merge(figment, &overlay);
            }
        }
        info!(path = %main.display(), "Loading configuration file");
        merge(figment, main)
    }
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|e| e.to_str()).unwrap_or_default() {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        ext => Err(ConfigError::ParseError(format!(
            "unsupported or disabled configuration format: .{ext}"
        ))),
    }
}

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<BrassConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` plus environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<BrassConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_defaults_without_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.bot.tick_interval_ms, 1000);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .file("/nonexistent/brass.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let mut custom = BrassConfig::default();
        custom.bot.tick_interval_ms = 250;
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(custom)
            .load()
            .unwrap();
        assert_eq!(config.bot.tick_interval_ms, 250);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_with_profile_overlay() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("brass.toml"),
            r#"
[logging]
level = "debug"

[bot.connection]
nick = "brassy"

[plugins]
load = ["Command", { name = "Dice", args = [6] }]

[settings.command]
prefix = "!"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("brass.production.toml"),
            "[bot]\ntick_interval_ms = 5000\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .profile("production")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.bot.connection.nick, "brassy");
        assert_eq!(config.bot.tick_interval_ms, 5000);
        assert_eq!(config.plugins.load.len(), 2);
        assert_eq!(
            config.plugin_settings().get_str("command.prefix"),
            Some("!")
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[bot]\ntick_interval_ms = 0\n").unwrap();

        let err = ConfigLoader::new().file(&path).without_env().load().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_environment_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BRASS_BOT__TICK_INTERVAL_MS", "250");
            jail.set_env("BRASS_SETTINGS__COMMAND__PREFIX", "!");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.bot.tick_interval_ms, 250);
            assert_eq!(
                config.plugin_settings().get_str("command.prefix"),
                Some("!")
            );
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_environment_beats_files() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("brass.toml", "[bot]\ntick_interval_ms = 500\n")?;
            jail.set_env("BRASS_BOT__TICK_INTERVAL_MS", "250");

            let mut custom = BrassConfig::default();
            custom.bot.tick_interval_ms = 750;
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(custom)
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.bot.tick_interval_ms, 250);

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.bot.tick_interval_ms, 500);
            Ok(())
        });
    }
}
