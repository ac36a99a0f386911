//! The Brass runtime: configuration, plugin loading and the event loop.
//!
//! ```rust,ignore
//! use brass_runtime::BrassRuntime;
//!
//! let mut runtime = BrassRuntime::builder()
//!     .config_file("brass.toml")
//!     .build()?;
//! runtime.run(&mut transport).await?;
//! ```
//!
//! The loop owns all dispatch state and is a single task.  Each iteration
//! waits for whichever comes first (shutdown, an inbound event, or a tick)
//! and then runs one synchronous dispatch pass to completion.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use brass_core::Transport;
use brass_framework::{PluginCatalog, PluginEntry, PluginHandler};
use tokio::signal;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{BrassConfig, ConfigLoader};
use crate::dispatch::{DispatchLoop, Phase};
use crate::error::RuntimeResult;
use crate::logging;

/// A configured bot: loaded plugins plus the loop that drives them.
#[derive(Debug)]
pub struct BrassRuntime {
    config: BrassConfig,
    dispatch: DispatchLoop,
    tick_interval: Duration,
}

impl BrassRuntime {
    /// Loads configuration from the default locations and builds a runtime.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Builds a runtime over every link-time plugin class.
    pub fn from_config(config: &BrassConfig) -> RuntimeResult<Self> {
        Self::with_catalog(config, PluginCatalog::linked())
    }

    /// Builds a runtime resolving plugins through `catalog`.
    ///
    /// Installs logging, configures the registry from `config.plugins` and
    /// loads every plugin in `plugins.load`, in order.  The first plugin
    /// that fails to load fails the whole build.
    pub fn with_catalog(config: &BrassConfig, catalog: PluginCatalog) -> RuntimeResult<Self> {
        if !logging::init_from_config(&config.logging) {
            debug!("Global subscriber already installed, keeping it");
        }

        let mut plugins = PluginHandler::new(catalog);
        plugins.set_settings(config.plugin_settings());
        plugins.set_connection(config.bot.connection.clone());
        plugins.set_autoload(config.plugins.autoload);
        plugins.set_manifest_extension(config.plugins.manifest_extension.clone());
        for path in &config.plugins.paths {
            match &path.dir {
                Some(dir) => plugins.add_path(dir, path.prefix.clone())?,
                None => plugins.add_builtin_path(path.prefix.clone()),
            }
        }
        plugins.add_plugins(config.plugins.load.iter().map(PluginEntry::from))?;

        let mut dispatch = DispatchLoop::new(plugins);
        dispatch
            .filter_mut()
            .exclude_plugins(config.plugins.exclude.iter().cloned());

        info!(
            plugins = ?dispatch.plugins().names(),
            excluded = ?config.plugins.exclude,
            nick = %config.bot.connection.nick,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            tick_interval: config.bot.tick_interval(),
            dispatch,
        })
    }

    pub fn config(&self) -> &BrassConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginHandler {
        self.dispatch.plugins()
    }

    /// The registry, e.g. to add instances that have no catalog class.
    pub fn plugins_mut(&mut self) -> &mut PluginHandler {
        self.dispatch.plugins_mut()
    }

    pub fn dispatch_mut(&mut self) -> &mut DispatchLoop {
        &mut self.dispatch
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Runs until Ctrl-C (or SIGTERM on Unix) or until the transport closes.
    pub async fn run<T>(&mut self, transport: &mut T) -> RuntimeResult<()>
    where
        T: Transport + ?Sized,
    {
        info!("Brass is running. Press Ctrl+C to stop.");
        self.run_until(transport, wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes or the transport closes.
    ///
    /// The first pass is `onConnect`; the first tick comes one interval later.
    /// A fatal hook error or a failed send ends the loop with that error.
    pub async fn run_until<T, F>(&mut self, transport: &mut T, shutdown: F) -> RuntimeResult<()>
    where
        T: Transport + ?Sized,
        F: Future<Output = ()>,
    {
        self.dispatch.run_pass(transport, Phase::Connect).await?;

        let period = self.tick_interval.max(Duration::from_millis(1));
        let mut ticks = time::interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            // inbound events drain before a due tick
            let phase = tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = transport.next_event() => match event {
                    Some(event) => Phase::Event(event),
                    None => {
                        info!("Transport closed");
                        break;
                    }
                },
                _ = ticks.tick() => Phase::Tick,
            };
            self.dispatch.run_pass(transport, phase).await?;
        }

        let leftover = self.dispatch.drain();
        if !leftover.is_empty() {
            let count = leftover.len();
            if let Err(e) = transport.send(leftover).await {
                warn!(error = %e, count, "Dropped events queued after the last pass");
            }
        }
        info!("Runtime stopped");
        Ok(())
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    res = signal::ctrl_c() => on_ctrl_c(res),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not register SIGTERM handler");
                on_ctrl_c(signal::ctrl_c().await);
            }
        }
    }

    #[cfg(not(unix))]
    on_ctrl_c(signal::ctrl_c().await);
}

fn on_ctrl_c(res: std::io::Result<()>) {
    match res {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

/// Builder loading configuration before constructing a [`BrassRuntime`].
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    loader: ConfigLoader,
    catalog: Option<PluginCatalog>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    pub fn search_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.loader = self.loader.search_path(dir);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    pub fn merge(mut self, config: BrassConfig) -> Self {
        self.loader = self.loader.merge(config);
        self
    }

    /// Resolves plugins through `catalog` instead of the linked one.
    pub fn catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> RuntimeResult<BrassRuntime> {
        let config = self.loader.load()?;
        match self.catalog {
            Some(catalog) => BrassRuntime::with_catalog(&config, catalog),
            None => BrassRuntime::from_config(&config),
        }
    }
}
