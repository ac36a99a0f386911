//! The plugin class table.
//!
//! Short names are resolved to classes through search paths (see
//! [`PluginHandler::add_path`](crate::PluginHandler::add_path)); a class is
//! looked up here by its fully qualified name, `<prefix><ShortName>`.
//!
//! The table is populated from two sources, in this order:
//!
//! 1. **Link-time registrations**: every crate linked into the binary may
//!    contribute [`PluginClass`] entries to the [`PLUGIN_CLASSES`] distributed
//!    slice.
//! 2. **Explicit registrations**: [`PluginCatalog::register`] at startup.
//!
//! A later registration of the same class name overwrites the earlier one,
//! which is how host applications replace a linked-in class.
//!
//! ```rust,ignore
//! use brass_framework::plugin::{PLUGIN_CLASSES, PluginClass};
//! use brass_framework::linkme::distributed_slice;
//!
//! #[distributed_slice(PLUGIN_CLASSES)]
//! #[linkme(crate = brass_framework::linkme)]
//! static DICE: PluginClass = PluginClass::concrete("mybot::plugin::Dice", |_| Ok(Box::new(Dice)));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use linkme::distributed_slice;
use serde_json::Value;
use tracing::debug;

use super::contract::Plugin;
use crate::error::{PluginError, PluginResult};

/// Constructor signature of a link-time plugin class.
pub type PluginConstructorFn = fn(&[Value]) -> Result<Box<dyn Plugin>, String>;

/// Constructor stored in the catalog; may capture state.
pub type PluginConstructor =
    Arc<dyn Fn(&[Value]) -> Result<Box<dyn Plugin>, String> + Send + Sync>;

/// A link-time class registration.
#[derive(Debug, Clone, Copy)]
pub struct PluginClass {
    /// Fully qualified class name (`<prefix><ShortName>`).
    pub name: &'static str,
    /// `None` marks an abstract class that cannot be instantiated.
    pub constructor: Option<PluginConstructorFn>,
}

impl PluginClass {
    pub const fn concrete(name: &'static str, constructor: PluginConstructorFn) -> Self {
        Self {
            name,
            constructor: Some(constructor),
        }
    }

    pub const fn abstract_class(name: &'static str) -> Self {
        Self {
            name,
            constructor: None,
        }
    }
}

/// Registry of link-time plugin classes.
#[distributed_slice]
pub static PLUGIN_CLASSES: [PluginClass];

#[derive(Clone)]
enum ClassEntry {
    Concrete(PluginConstructor),
    Abstract,
}

/// Process-wide table of constructible plugin classes.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    classes: HashMap<String, ClassEntry>,
}

impl PluginCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding every link-time registration.
    pub fn linked() -> Self {
        let mut catalog = Self::new();
        for class in PLUGIN_CLASSES {
            match class.constructor {
                Some(ctor) => catalog.register(class.name, ctor),
                None => catalog.register_abstract(class.name),
            }
        }
        debug!(classes = catalog.len(), "Plugin catalog built from link-time registrations");
        catalog
    }

    /// Registers (or replaces) a concrete class.
    pub fn register<F>(&mut self, class: impl Into<String>, constructor: F)
    where
        F: Fn(&[Value]) -> Result<Box<dyn Plugin>, String> + Send + Sync + 'static,
    {
        let class = class.into();
        if self
            .classes
            .insert(class.clone(), ClassEntry::Concrete(Arc::new(constructor)))
            .is_some()
        {
            debug!(class = %class, "Plugin class replaced by later registration");
        }
    }

    /// Registers (or replaces) an abstract class.
    pub fn register_abstract(&mut self, class: impl Into<String>) {
        self.classes.insert(class.into(), ClassEntry::Abstract);
    }

    /// Removes a class.  Returns `true` when it was present.
    pub fn unregister(&mut self, class: &str) -> bool {
        self.classes.remove(class).is_some()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Constructs an instance of `class`.
    ///
    /// Returns `Ok(None)` when the class is not registered, and
    /// [`PluginError::ClassNotInstantiable`] when it is abstract or its
    /// constructor rejects `args`.
    pub fn instantiate(&self, class: &str, args: &[Value]) -> PluginResult<Option<Box<dyn Plugin>>> {
        match self.classes.get(class) {
            None => Ok(None),
            Some(ClassEntry::Abstract) => Err(PluginError::ClassNotInstantiable {
                class: class.to_string(),
                reason: "class is abstract".to_string(),
            }),
            Some(ClassEntry::Concrete(ctor)) => {
                ctor(args)
                    .map(Some)
                    .map_err(|reason| PluginError::ClassNotInstantiable {
                        class: class.to_string(),
                        reason,
                    })
            }
        }
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("PluginCatalog")
            .field("classes", &names)
            .finish()
    }
}
