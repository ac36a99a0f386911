//! [`Settings`]: the string-keyed configuration lookup handed to plugins.
//!
//! The runtime loads the `settings` section of `brass.toml` (or any other
//! figment source) and wraps it in a `Settings`.  Keys are dotted paths:
//!
//! ```toml
//! [settings.command]
//! prefix = "!"
//! ```
//!
//! ```rust,ignore
//! let prefix = ctx.config()?.get_str("command.prefix");
//! ```
//!
//! A flat key containing dots (`"command.prefix" = "!"`) is found as well;
//! the exact key wins over the nested path.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Read-mostly lookup over a JSON object with dotted-path keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Map<String, Value>,
}

impl Settings {
    /// Creates empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored at `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.root.get(key) {
            return Some(value);
        }
        let mut parts = key.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Returns `true` if a value exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the string stored at `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the boolean stored at `key`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the unsigned integer stored at `key`.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Deserialises the value stored at `key` into `T`.
    ///
    /// Returns `None` when the key is absent or the value has the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Stores `value` under the dotted path `key`, creating intermediate
    /// objects as needed.  Non-object intermediates are overwritten.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };
        let mut current = &mut self.root;
        for part in parts {
            let slot = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert(last.to_string(), value.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

impl From<Value> for Settings {
    /// Non-object values yield empty settings.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_lookup() {
        let settings = Settings::from(json!({
            "command": { "prefix": "!" },
            "plugins": { "autoload": true }
        }));
        assert_eq!(settings.get_str("command.prefix"), Some("!"));
        assert_eq!(settings.get_bool("plugins.autoload"), Some(true));
        assert!(settings.get("command.missing").is_none());
        assert!(settings.get("command.prefix.deeper").is_none());
    }

    #[test]
    fn test_flat_key_wins() {
        let settings = Settings::from(json!({
            "command.prefix": "?",
            "command": { "prefix": "!" }
        }));
        assert_eq!(settings.get_str("command.prefix"), Some("?"));
    }

    #[test]
    fn test_set_creates_path() {
        let settings = Settings::new()
            .with("command.prefix", "!")
            .with("prioritize.drop_unlisted", true);
        assert_eq!(settings.get_str("command.prefix"), Some("!"));
        assert_eq!(settings.get_bool("prioritize.drop_unlisted"), Some(true));
        assert!(settings.get("command").unwrap().is_object());
    }

    #[test]
    fn test_set_overwrites_scalar_intermediate() {
        let mut settings = Settings::new().with("command", "scalar");
        settings.set("command.prefix", "!");
        assert_eq!(settings.get_str("command.prefix"), Some("!"));
    }

    #[test]
    fn test_get_as() {
        let settings = Settings::from(json!({ "cron": { "jobs": [1, 2, 3] } }));
        let jobs: Vec<u32> = settings.get_as("cron.jobs").unwrap();
        assert_eq!(jobs, vec![1, 2, 3]);
        assert!(settings.get_as::<String>("cron.jobs").is_none());
    }

    #[test]
    fn test_non_object_is_empty() {
        let settings = Settings::from(Value::Null);
        assert!(settings.as_map().is_empty());
    }
}
