//! [`PluginFilter`]: a composable exclusion view over the registry.
//!
//! A filter holds no plugins of its own.  It is applied to the registry each
//! time it is iterated ([`PluginHandler::iter_filtered`](crate::PluginHandler::iter_filtered)
//! or [`PluginFilter::apply`]), so every iteration starts at the first loaded
//! plugin and sees plugins added or removed since the last one.

use std::borrow::Borrow;
use std::collections::HashSet;

use crate::plugin::{Hook, PluginHandle};

/// Excludes plugins by short name or by declared hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginFilter {
    names: HashSet<String>,
    hooks: Vec<Hook>,
}

impl PluginFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects plugins registered under any of `names`.
    pub fn exclude_plugins<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Rejects plugins declaring any of `hooks`.
    pub fn exclude_by_capability<I>(&mut self, hooks: I) -> &mut Self
    where
        I: IntoIterator<Item = Hook>,
    {
        for hook in hooks {
            if !self.hooks.contains(&hook) {
                self.hooks.push(hook);
            }
        }
        self
    }

    /// Drops every exclusion; the filter then accepts all plugins.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.names.clear();
        self.hooks.clear();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.hooks.is_empty()
    }

    /// Returns `true` if `plugin` passes every exclusion.
    pub fn accepts(&self, plugin: &PluginHandle) -> bool {
        !self.names.contains(plugin.name()) && !self.hooks.iter().any(|h| plugin.implements(h))
    }

    /// Lazily filters any sequence of plugin handles.
    pub fn apply<'f, I>(&'f self, plugins: I) -> impl Iterator<Item = I::Item> + 'f
    where
        I: IntoIterator,
        I::IntoIter: 'f,
        I::Item: Borrow<PluginHandle>,
    {
        plugins
            .into_iter()
            .filter(move |plugin| self.accepts(plugin.borrow()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::PluginHandler;
    use crate::plugin::{Capabilities, Plugin, PluginCatalog};

    struct Ticker(&'static str);

    impl Plugin for Ticker {
        fn name(&self) -> &str {
            self.0
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new().hook(Hook::Tick)
        }
    }

    struct Quiet(&'static str);

    impl Plugin for Quiet {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn names<'a>(iter: impl Iterator<Item = &'a PluginHandle>) -> Vec<String> {
        iter.map(|p| p.name().to_string()).collect()
    }

    fn registry() -> PluginHandler {
        let mut handler = PluginHandler::new(PluginCatalog::new());
        handler.add_instance(Box::new(Ticker("A"))).unwrap();
        handler.add_instance(Box::new(Quiet("B"))).unwrap();
        handler.add_instance(Box::new(Ticker("C"))).unwrap();
        handler
    }

    #[test]
    fn test_empty_filter_accepts_all() {
        let handler = registry();
        let filter = PluginFilter::new();
        assert!(filter.is_empty());
        assert_eq!(names(handler.iter_filtered(&filter)), ["A", "B", "C"]);
    }

    #[test]
    fn test_exclude_by_name_and_capability() {
        let handler = registry();
        let mut filter = PluginFilter::new();
        filter.exclude_plugins(["A"]);
        assert_eq!(names(handler.iter_filtered(&filter)), ["B", "C"]);

        filter.exclude_by_capability([Hook::Tick]);
        assert_eq!(names(handler.iter_filtered(&filter)), ["B"]);

        filter.clear_filters();
        assert_eq!(names(handler.iter_filtered(&filter)), ["A", "B", "C"]);
    }

    #[test]
    fn test_reflects_membership_changes() {
        let mut handler = registry();
        let mut filter = PluginFilter::new();
        filter.exclude_plugins(["B"]);

        assert_eq!(names(handler.iter_filtered(&filter)), ["A", "C"]);
        handler.remove_plugin("A");
        handler.add_instance(Box::new(Quiet("D"))).unwrap();
        assert_eq!(names(handler.iter_filtered(&filter)), ["C", "D"]);
        // restartable: a second pass starts at the first plugin again
        assert_eq!(names(handler.iter_filtered(&filter)), ["C", "D"]);
    }

    #[test]
    fn test_apply_over_owned_handles() {
        let handler = registry();
        let owned: Vec<PluginHandle> = handler.iter().cloned().collect();
        let mut filter = PluginFilter::new();
        filter.exclude_by_capability([Hook::Tick]);

        let kept: Vec<String> = filter
            .apply(owned)
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(kept, ["B"]);
    }
}
