//! Plugin registry: resolution, lifecycle and broadcast.
//!
//! [`PluginHandler`] is the single owner of every loaded plugin.  It:
//!
//! - Resolves short names to classes through an ordered list of search paths
//!   and the [`PluginCatalog`], constructing instances on demand.
//! - Stores each instance under its short name *before* running `on_load`, so
//!   a dependency that asks for the loading plugin gets the existing handle
//!   back instead of recursing.  A failing `on_load` removes the plugin again
//!   and marks the name [`PluginState::Failed`], unless it was replacing a
//!   loaded instance, which is then restored.
//! - Broadcasts hooks to every plugin that declares them, in registration
//!   order, optionally through a [`PluginFilter`].
//!
//! # Resolution
//!
//! ```text
//! add_plugin("Dice")
//!   └─ for path in paths (last added first):
//!        dir-less path ─────────────► class "<prefix>Dice"
//!        dir/Dice.<ext> exists ─────► class "<prefix>Dice"
//!        class in catalog? ─── no ──► next path
//!                          └── yes ─► instantiate, check API version, store, on_load
//! ```
//!
//! [`PluginHandler::new`] installs one dir-less path with the
//! [`BUILTIN_PREFIX`]; being the first path it has the lowest priority.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brass_core::Connection;
use serde_json::Value;
use tracing::{debug, debug_span, error, info, warn};

use crate::error::{PluginError, PluginResult};
use crate::filter::PluginFilter;
use crate::plugin::{
    BRASS_PLUGIN_API_VERSION, Context, Flow, Hook, Plugin, PluginCatalog, PluginHandle,
    invoke, is_compatible,
};
use crate::settings::Settings;

/// Class prefix of the plugins shipped with Brass.
pub const BUILTIN_PREFIX: &str = "brass::plugin::";

/// Default extension of plugin manifest files.
pub const DEFAULT_MANIFEST_EXTENSION: &str = "toml";

/// One plugin search location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    /// Directory holding `<ShortName>.<ext>` manifests; `None` resolves any
    /// short name whose class is present in the catalog.
    pub dir: Option<PathBuf>,
    /// Prepended to the short name to form the class name.
    pub prefix: String,
}

/// Lifecycle state of a short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Never loaded, or removed.
    Unregistered,
    /// Loaded and receiving hooks.
    Loaded,
    /// The last load attempt failed.
    Failed,
}

/// An entry of [`PluginHandler::add_plugins`].
#[derive(Debug, Clone, PartialEq)]
pub enum PluginEntry {
    Name(String),
    WithArgs(String, Vec<Value>),
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        match self {
            PluginEntry::Name(name) | PluginEntry::WithArgs(name, _) => name,
        }
    }
}

impl From<&str> for PluginEntry {
    fn from(name: &str) -> Self {
        PluginEntry::Name(name.to_string())
    }
}

impl From<String> for PluginEntry {
    fn from(name: String) -> Self {
        PluginEntry::Name(name)
    }
}

impl<S: Into<String>> From<(S, Vec<Value>)> for PluginEntry {
    fn from((name, args): (S, Vec<Value>)) -> Self {
        PluginEntry::WithArgs(name.into(), args)
    }
}

/// A hook error caught at the per-plugin boundary.
#[derive(Debug, Clone)]
pub struct HookFailure {
    pub plugin: String,
    pub error: PluginError,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default)]
pub struct BroadcastReport {
    invoked: Vec<String>,
    skipped: Vec<String>,
    failures: Vec<HookFailure>,
    stopped_by: Option<String>,
}

impl BroadcastReport {
    /// Plugins whose hook ran, in call order.
    pub fn invoked(&self) -> &[String] {
        &self.invoked
    }

    /// Plugins skipped because they were busy.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn failures(&self) -> &[HookFailure] {
        &self.failures
    }

    /// The plugin that returned [`Flow::Stop`], if any.
    pub fn stopped_by(&self) -> Option<&str> {
        self.stopped_by.as_deref()
    }

    pub fn stopped(&self) -> bool {
        self.stopped_by.is_some()
    }

    /// Merges another report into this one.
    pub fn absorb(&mut self, other: BroadcastReport) {
        self.invoked.extend(other.invoked);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
        if self.stopped_by.is_none() {
            self.stopped_by = other.stopped_by;
        }
    }
}

/// The plugin registry.
pub struct PluginHandler {
    plugins: Vec<PluginHandle>,
    paths: Vec<SearchPath>,
    catalog: PluginCatalog,
    autoload: bool,
    failed: HashSet<String>,
    settings: Arc<Settings>,
    connection: Option<Arc<Connection>>,
    manifest_extension: String,
    /// Failures reported by broadcasts nested inside the running hook.
    nested: Vec<HookFailure>,
}

impl Default for PluginHandler {
    /// A registry over every link-time plugin class.
    fn default() -> Self {
        Self::new(PluginCatalog::linked())
    }
}

impl PluginHandler {
    /// Creates an empty registry over `catalog`, with autoload disabled.
    pub fn new(catalog: PluginCatalog) -> Self {
        Self {
            plugins: Vec::new(),
            paths: vec![SearchPath {
                dir: None,
                prefix: BUILTIN_PREFIX.to_string(),
            }],
            catalog,
            autoload: false,
            failed: HashSet::new(),
            settings: Arc::new(Settings::new()),
            connection: None,
            manifest_extension: DEFAULT_MANIFEST_EXTENSION.to_string(),
            nested: Vec::new(),
        }
    }

    // ─── Configuration ────────────────────────────────────────────────────────

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = Arc::new(settings);
    }

    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    pub fn set_connection(&mut self, connection: Connection) {
        self.connection = Some(Arc::new(connection));
    }

    pub fn connection(&self) -> Option<Arc<Connection>> {
        self.connection.clone()
    }

    pub fn set_manifest_extension(&mut self, ext: impl Into<String>) {
        self.manifest_extension = ext.into().trim_start_matches('.').to_string();
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PluginCatalog {
        &mut self.catalog
    }

    pub fn set_autoload(&mut self, autoload: bool) {
        self.autoload = autoload;
    }

    pub fn autoload(&self) -> bool {
        self.autoload
    }

    // ─── Search paths ─────────────────────────────────────────────────────────

    /// Adds a manifest directory.  Paths added later are searched first.
    pub fn add_path(&mut self, dir: impl AsRef<Path>, prefix: impl Into<String>) -> PluginResult<()> {
        let dir = dir.as_ref();
        fs::read_dir(dir).map_err(|e| PluginError::DirectoryNotReadable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let prefix = prefix.into();
        debug!(dir = %dir.display(), prefix = %prefix, "Plugin search path added");
        self.paths.push(SearchPath {
            dir: Some(dir.to_path_buf()),
            prefix,
        });
        Ok(())
    }

    /// Adds a dir-less path resolving any class `<prefix><ShortName>` present
    /// in the catalog.
    pub fn add_builtin_path(&mut self, prefix: impl Into<String>) {
        self.paths.push(SearchPath {
            dir: None,
            prefix: prefix.into(),
        });
    }

    pub fn paths(&self) -> &[SearchPath] {
        &self.paths
    }

    // ─── Loading ──────────────────────────────────────────────────────────────

    /// Loads the plugin registered under `name`, or returns it if already
    /// loaded.  `args` are passed to the class constructor.
    pub fn add_plugin(&mut self, name: &str, args: Option<Vec<Value>>) -> PluginResult<PluginHandle> {
        if let Some(existing) = self.find(name) {
            return Ok(existing.clone());
        }

        let span = debug_span!("add_plugin", plugin = %name);
        let _enter = span.enter();

        let plugin = match self.resolve(name, args.as_deref().unwrap_or_default()) {
            Ok(plugin) => plugin,
            Err(e) => {
                error!(plugin = %name, error = %e, "Plugin could not be resolved");
                self.failed.insert(name.to_string());
                return Err(e);
            }
        };
        self.store_and_load(name.to_string(), plugin)
    }

    /// Stores a live instance under its own name, replacing (in place) any
    /// plugin of the same name, then runs its `on_load`.
    pub fn add_instance(&mut self, plugin: Box<dyn Plugin>) -> PluginResult<PluginHandle> {
        let name = plugin.name().to_string();
        if !is_compatible(plugin.api_version()) {
            self.failed.insert(name.clone());
            return Err(PluginError::IncorrectBaseClass {
                class: name,
                found: plugin.api_version(),
                expected: BRASS_PLUGIN_API_VERSION,
            });
        }
        self.store_and_load(name, plugin)
    }

    /// Loads every entry in order, stopping at the first error.
    pub fn add_plugins<I, E>(&mut self, entries: I) -> PluginResult<Vec<PluginHandle>>
    where
        I: IntoIterator<Item = E>,
        E: Into<PluginEntry>,
    {
        entries
            .into_iter()
            .map(|entry| match entry.into() {
                PluginEntry::Name(name) => self.add_plugin(&name, None),
                PluginEntry::WithArgs(name, args) => self.add_plugin(&name, Some(args)),
            })
            .collect()
    }

    /// Removes the plugin registered under `name`; no-op if absent.
    pub fn remove_plugin(&mut self, name: &str) -> Option<PluginHandle> {
        let pos = self.plugins.iter().position(|p| p.name() == name)?;
        let handle = self.plugins.remove(pos);
        info!(plugin = %name, "Plugin removed");
        Some(handle)
    }

    /// Removes `handle` if it is the instance currently registered.
    pub fn remove_instance(&mut self, handle: &PluginHandle) -> bool {
        match self.plugins.iter().position(|p| p.ptr_eq(handle)) {
            Some(pos) => {
                self.plugins.remove(pos);
                info!(plugin = %handle.name(), "Plugin removed");
                true
            }
            None => false,
        }
    }

    fn resolve(&self, name: &str, args: &[Value]) -> PluginResult<Box<dyn Plugin>> {
        for path in self.paths.iter().rev() {
            if let Some(dir) = &path.dir {
                let manifest = dir.join(format!("{name}.{}", self.manifest_extension));
                if !manifest.is_file() {
                    continue;
                }
            }
            let class = format!("{}{name}", path.prefix);
            let Some(plugin) = self.catalog.instantiate(&class, args)? else {
                continue;
            };
            if !is_compatible(plugin.api_version()) {
                return Err(PluginError::IncorrectBaseClass {
                    class,
                    found: plugin.api_version(),
                    expected: BRASS_PLUGIN_API_VERSION,
                });
            }
            debug!(plugin = %name, class = %class, "Plugin class resolved");
            return Ok(plugin);
        }
        Err(PluginError::ClassNotFound {
            name: name.to_string(),
        })
    }

    fn store_and_load(&mut self, name: String, plugin: Box<dyn Plugin>) -> PluginResult<PluginHandle> {
        let handle = PluginHandle::new(name.clone(), plugin);
        let displaced = match self.plugins.iter().position(|p| p.name() == name) {
            Some(pos) => Some(std::mem::replace(&mut self.plugins[pos], handle.clone())),
            None => {
                self.plugins.push(handle.clone());
                None
            }
        };

        let settings = Arc::clone(&self.settings);
        let connection = self.connection.clone();
        let pending = std::mem::take(&mut self.nested);
        let loaded = {
            let mut plugin = handle.lock()?;
            let mut ctx = Context::new(&name).with_config(&settings).with_plugins(self);
            if let Some(conn) = connection.as_deref() {
                ctx = ctx.with_connection(conn);
            }
            plugin.on_load(&mut ctx)
        };
        self.nested = pending;

        match loaded {
            Ok(()) => {
                self.failed.remove(&name);
                info!(plugin = %name, "Plugin loaded");
                Ok(handle)
            }
            Err(e) => {
                let pos = self.plugins.iter().position(|p| p.ptr_eq(&handle));
                match (displaced, pos) {
                    (Some(previous), Some(pos)) => {
                        self.plugins[pos] = previous;
                        error!(plugin = %name, error = %e, "Replacement failed to load, keeping previous instance");
                    }
                    _ => {
                        self.remove_instance(&handle);
                        self.failed.insert(name.clone());
                        error!(plugin = %name, error = %e, "Plugin failed to load");
                    }
                }
                Err(e)
            }
        }
    }

    // ─── Lookup ───────────────────────────────────────────────────────────────

    fn find(&self, name: &str) -> Option<&PluginHandle> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Returns the loaded plugin, loading it first when autoload is enabled.
    pub fn get_plugin(&mut self, name: &str) -> PluginResult<PluginHandle> {
        if let Some(existing) = self.find(name) {
            return Ok(existing.clone());
        }
        if !self.autoload {
            return Err(PluginError::PluginNotLoaded(name.to_string()));
        }
        self.add_plugin(name, None)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn state(&self, name: &str) -> PluginState {
        if self.has_plugin(name) {
            PluginState::Loaded
        } else if self.failed.contains(name) {
            PluginState::Failed
        } else {
            PluginState::Unregistered
        }
    }

    /// Loaded plugins in registration order.  Each call starts over.
    pub fn iter(&self) -> std::slice::Iter<'_, PluginHandle> {
        self.plugins.iter()
    }

    /// Loaded plugins accepted by `filter`, in registration order.
    pub fn iter_filtered<'a>(
        &'a self,
        filter: &'a PluginFilter,
    ) -> impl Iterator<Item = &'a PluginHandle> + 'a {
        filter.apply(self.plugins.iter())
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginHandle::name).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    // ─── Broadcast ────────────────────────────────────────────────────────────

    /// Invokes `hook` on every plugin that declares it, in registration order.
    ///
    /// `ctx` carries the shared parts of the pass (queue, event, config,
    /// connection); each plugin receives a copy scoped to its own name with
    /// this registry attached.  The targets are fixed when the broadcast
    /// starts.
    ///
    /// - [`Flow::Stop`] ends the broadcast.
    /// - A busy plugin (its hook is already on the stack) is skipped.
    /// - A hook error is logged and recorded; the broadcast continues.
    /// - Failures from broadcasts a hook makes through
    ///   [`Context::broadcast`] are recorded here too, ahead of the hook's own.
    /// - [`PluginError::Fatal`] aborts the broadcast and is returned.
    pub fn broadcast(
        &mut self,
        ctx: &mut Context<'_>,
        hook: &Hook,
        args: &[String],
        filter: Option<&PluginFilter>,
    ) -> PluginResult<BroadcastReport> {
        let targets: Vec<PluginHandle> = self
            .plugins
            .iter()
            .filter(|p| p.implements(hook))
            .filter(|p| filter.is_none_or(|f| f.accepts(p)))
            .cloned()
            .collect();

        let pending = std::mem::take(&mut self.nested);
        let mut report = BroadcastReport::default();
        for target in targets {
            let name = target.name();
            let span = debug_span!("hook", hook = %hook, plugin = %name);
            let _enter = span.enter();

            let mut plugin = match target.lock() {
                Ok(guard) => guard,
                Err(e) => {
                    warn!(error = %e, "Skipping busy plugin");
                    report.skipped.push(name.to_string());
                    continue;
                }
            };
            let mut scoped = ctx.scoped(name).with_plugins(self);
            let outcome = invoke(&mut **plugin, &mut scoped, hook, args);
            drop(plugin);
            report.invoked.push(name.to_string());
            report.failures.append(&mut self.nested);

            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    debug!("Broadcast stopped");
                    report.stopped_by = Some(name.to_string());
                    break;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Fatal error in plugin hook");
                    self.nested = pending;
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "Plugin hook failed");
                    report.failures.push(HookFailure {
                        plugin: name.to_string(),
                        error: e,
                    });
                }
            }
        }
        self.nested = pending;
        Ok(report)
    }

    pub(crate) fn record_nested(&mut self, failures: &[HookFailure]) {
        self.nested.extend_from_slice(failures);
    }

    /// [`broadcast`](Self::broadcast) for a hook given by its conventional
    /// name (`onTick`, `preEvent`, `onPrivmsg`, `onCommandRoll`, ...).
    pub fn broadcast_named(
        &mut self,
        ctx: &mut Context<'_>,
        hook: &str,
        args: &[String],
        filter: Option<&PluginFilter>,
    ) -> PluginResult<BroadcastReport> {
        let hook: Hook = hook.parse()?;
        self.broadcast(ctx, &hook, args, filter)
    }
}

impl std::fmt::Debug for PluginHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandler")
            .field("plugins", &self.names())
            .field("paths", &self.paths)
            .field("autoload", &self.autoload)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
