use std::collections::HashMap;

use tracing::{debug, warn};

use crate::plugin::PluginHandle;

/// Parameter counts of a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arity {
    pub total: usize,
    pub required: usize,
    /// Plugin whose declaration the arity was taken from.
    pub plugin: String,
}

/// Handler name → [`Arity`], unioned over every loaded plugin.
///
/// When two plugins declare the same handler, the first one in registration
/// order supplies the arity.
#[derive(Debug, Clone, Default)]
pub struct CommandMethodCache {
    methods: HashMap<String, Arity>,
}

impl CommandMethodCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the declared commands of `plugins`, in order.
    pub fn populate<'a>(&mut self, plugins: impl IntoIterator<Item = &'a PluginHandle>) {
        for plugin in plugins {
            for spec in plugin.capabilities().commands() {
                let name = spec.handler_name();
                match self.methods.get(&name) {
                    Some(existing) if existing.plugin != plugin.name() => {
                        warn!(
                            handler = %name,
                            kept = %existing.plugin,
                            ignored = %plugin.name(),
                            "Command handler declared by several plugins; keeping the first arity"
                        );
                    }
                    Some(_) => {}
                    None => {
                        self.methods.insert(
                            name,
                            Arity {
                                total: spec.total_params(),
                                required: spec.required_params(),
                                plugin: plugin.name().to_string(),
                            },
                        );
                    }
                }
            }
        }
        debug!(handlers = self.methods.len(), "Command method cache populated");
    }

    pub fn get(&self, handler_name: &str) -> Option<&Arity> {
        self.methods.get(handler_name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn clear(&mut self) {
        self.methods.clear();
    }
}
