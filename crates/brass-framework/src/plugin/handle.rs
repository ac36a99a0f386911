use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::contract::{AsAny, Capabilities, Hook, Plugin};
use crate::error::{PluginError, PluginResult};

struct PluginSlot {
    name: String,
    capabilities: Capabilities,
    instance: Mutex<Box<dyn Plugin>>,
}

/// Shared handle to a loaded plugin instance.
///
/// Cloning a handle is cheap; all clones refer to the same instance.  The
/// short name and the capability table are captured at registration and do
/// not require the lock.
#[derive(Clone)]
pub struct PluginHandle {
    slot: Arc<PluginSlot>,
}

impl PluginHandle {
    pub(crate) fn new(name: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        let capabilities = plugin.capabilities();
        Self {
            slot: Arc::new(PluginSlot {
                name: name.into(),
                capabilities,
                instance: Mutex::new(plugin),
            }),
        }
    }

    /// Short name the plugin is registered under.
    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.slot.capabilities
    }

    /// Returns `true` if the plugin declared `hook`.
    pub fn implements(&self, hook: &Hook) -> bool {
        self.slot.capabilities.implements(hook)
    }

    /// Returns `true` if both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &PluginHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Locks the instance.
    ///
    /// Fails with [`PluginError::PluginBusy`] instead of blocking when a hook
    /// of this plugin is already running further up the stack.
    pub fn lock(&self) -> PluginResult<MutexGuard<'_, Box<dyn Plugin>>> {
        self.slot
            .instance
            .try_lock()
            .ok_or_else(|| PluginError::PluginBusy(self.slot.name.clone()))
    }

    /// Runs `f` against the instance downcast to `T`.
    ///
    /// ```rust,ignore
    /// let cron = ctx.plugins()?.get_plugin("Cron")?;
    /// cron.with::<Cron, _>(|cron| cron.schedule_every(Duration::from_secs(60), job))?;
    /// ```
    pub fn with<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> PluginResult<R>
    where
        T: Plugin,
    {
        let mut guard = self.lock()?;
        let any = <dyn Plugin as AsAny>::as_any_mut(&mut **guard);
        match any.downcast_mut::<T>() {
            Some(plugin) => Ok(f(plugin)),
            None => Err(PluginError::TypeMismatch {
                plugin: self.slot.name.clone(),
                expected: std::any::type_name::<T>(),
            }),
        }
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.slot.name)
            .field("capabilities", &self.slot.capabilities)
            .finish()
    }
}
