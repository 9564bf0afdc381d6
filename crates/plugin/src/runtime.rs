// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plugin runtime: registration API, invocation fan-outs, and the
//! reconfiguration protocol.
//!
//! Registration calls take an explicit `scope`: the context of the
//! registering plugin, or `None` for the daemon's built-ins. Callback
//! invocation hands every callback its own context back; there is no
//! thread-local state.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use sysinv_core::time::{self, format_interval};
use sysinv_core::{
    Interval, MetricStoreRef, StoreError, StoreWriter, TimeSeries, TimeSeriesOpts, Timestamp,
    UpdateStatus, Value,
};

use crate::context::PluginContext;
use crate::error::PluginError;
use crate::info::{ConfigItem, PluginConfig};
use crate::log::Priority;
use crate::registry::{
    CnameFn, CollectorEntry, CollectorFn, CollectorQueue, ConfigFn, FetchFn, InitFn, LogFn,
    Registry, ShutdownFn,
};

fn scoped_name(scope: Option<&Arc<PluginContext>>, name: &str) -> String {
    match scope {
        Some(ctx) => format!("{}::{}", ctx.name(), name),
        None => format!("core::{name}"),
    }
}

/// The plugin runtime. One per daemon.
pub struct PluginRuntime {
    /// Contexts of all loaded plugins, in load order.
    plugins: Mutex<Vec<Arc<PluginContext>>>,

    config: Mutex<Registry<ConfigFn>>,
    init: Mutex<Registry<InitFn>>,
    shutdown: Mutex<Registry<ShutdownFn>>,
    log: Mutex<Registry<LogFn>>,
    cname: Mutex<Registry<CnameFn>>,
    collectors: Mutex<CollectorQueue>,
    fetchers: Mutex<Registry<FetchFn>>,
    writers: Mutex<Registry<Arc<dyn StoreWriter>>>,
}

impl Default for PluginRuntime {
    fn default() -> Self {
        PluginRuntime {
            plugins: Mutex::new(Vec::new()),
            config: Mutex::new(Registry::new("config")),
            init: Mutex::new(Registry::new("init")),
            shutdown: Mutex::new(Registry::new("shutdown")),
            log: Mutex::new(Registry::new("log")),
            cname: Mutex::new(Registry::new("cname")),
            collectors: Mutex::new(CollectorQueue::default()),
            fetchers: Mutex::new(Registry::new("timeseries fetcher")),
            writers: Mutex::new(Registry::new("store writer")),
        }
    }
}

impl PluginRuntime {
    pub fn new() -> Self {
        PluginRuntime::default()
    }

    /// Load (or reload) the named plugin from `basedir`.
    pub fn load(
        self: &Arc<Self>,
        basedir: &Path,
        name: &str,
        config: Option<PluginConfig>,
    ) -> Result<(), PluginError> {
        crate::loader::load(self, basedir, name, config)
    }

    // --- plugin contexts -------------------------------------------------

    pub(crate) fn add_plugin(&self, ctx: Arc<PluginContext>) {
        self.plugins.lock().push(ctx);
    }

    pub fn plugin(&self, name: &str) -> Option<Arc<PluginContext>> {
        self.plugins.lock().iter().find(|c| c.name().eq_ignore_ascii_case(name)).cloned()
    }

    pub fn plugins(&self) -> Vec<Arc<PluginContext>> {
        self.plugins.lock().clone()
    }

    // --- registration ----------------------------------------------------

    /// Register a config callback. Requires a plugin scope; the callback
    /// registers under the plugin's own name.
    pub fn register_config(
        &self,
        scope: Option<&Arc<PluginContext>>,
        callback: ConfigFn,
    ) -> Result<(), PluginError> {
        let Some(ctx) = scope else {
            error!("Invalid attempt to register a config callback from outside a plugin");
            return Err(PluginError::NoContext("config"));
        };
        self.config.lock().insert(ctx.name().to_string(), Some(Arc::clone(ctx)), callback)
    }

    pub fn register_init(
        &self,
        scope: Option<&Arc<PluginContext>>,
        name: &str,
        callback: InitFn,
    ) -> Result<(), PluginError> {
        add_callback(&self.init, scope, name, callback)
    }

    pub fn register_shutdown(
        &self,
        scope: Option<&Arc<PluginContext>>,
        name: &str,
        callback: ShutdownFn,
    ) -> Result<(), PluginError> {
        add_callback(&self.shutdown, scope, name, callback)
    }

    pub fn register_log(
        &self,
        scope: Option<&Arc<PluginContext>>,
        name: &str,
        callback: LogFn,
    ) -> Result<(), PluginError> {
        add_callback(&self.log, scope, name, callback)
    }

    pub fn register_cname(
        &self,
        scope: Option<&Arc<PluginContext>>,
        name: &str,
        callback: CnameFn,
    ) -> Result<(), PluginError> {
        add_callback(&self.cname, scope, name, callback)
    }

    /// Register a collector. Without an explicit interval the registering
    /// plugin's configured interval applies; a zero interval defers to the
    /// loop default at schedule time.
    pub fn register_collector(
        &self,
        scope: Option<&Arc<PluginContext>>,
        name: &str,
        interval: Option<Interval>,
        callback: CollectorFn,
    ) -> Result<(), PluginError> {
        if name.is_empty() {
            return Err(PluginError::InvalidArgument("collector name"));
        }
        let cb_name = scoped_name(scope, name);
        let interval = match interval {
            Some(interval) => interval,
            None => match scope {
                Some(ctx) => ctx.config().interval,
                None => {
                    error!(
                        "Cannot determine interval for collector {}; \
                         none specified and no plugin context found",
                        cb_name
                    );
                    return Err(PluginError::NoContext("collector interval"));
                }
            },
        };

        let mut queue = self.collectors.lock();
        if queue.contains(&cb_name) {
            tracing::warn!(
                "collector callback {:?} has already been registered. \
                 Ignoring newly registered version.",
                cb_name
            );
            return Err(PluginError::Duplicate { kind: "collector", name: cb_name });
        }
        queue.insert_sorted(CollectorEntry {
            name: cb_name.clone(),
            ctx: scope.cloned(),
            callback,
            interval,
            next_update: time::now(),
        });
        info!(
            "Registered collector callback {:?} (interval = {}).",
            cb_name,
            format_interval(interval)
        );
        Ok(())
    }

    /// Register a time-series fetcher under its raw fetcher-type name.
    pub fn register_fetcher(
        &self,
        scope: Option<&Arc<PluginContext>>,
        fetcher_type: &str,
        callback: FetchFn,
    ) -> Result<(), PluginError> {
        if fetcher_type.is_empty() {
            return Err(PluginError::InvalidArgument("fetcher type"));
        }
        self.fetchers.lock().insert(fetcher_type.to_string(), scope.cloned(), callback)
    }

    /// Register a store writer. The trait object carries all six store
    /// operations, so a partial writer cannot exist.
    pub fn register_writer(
        &self,
        scope: Option<&Arc<PluginContext>>,
        name: &str,
        writer: Arc<dyn StoreWriter>,
    ) -> Result<(), PluginError> {
        add_callback(&self.writers, scope, name, writer)
    }

    // --- configuration and lifecycle fan-outs ----------------------------

    /// Hand a parsed configuration item to the named plugin's config
    /// callback.
    pub fn configure(&self, plugin: &str, item: &ConfigItem) -> Result<(), PluginError> {
        let found = {
            let registry = self.config.lock();
            registry.find(plugin).map(|e| (e.ctx.clone(), Arc::clone(&e.callback)))
        };
        match found {
            Some((Some(ctx), callback)) => callback(&ctx, Some(item)),
            Some((None, _)) => Err(PluginError::NoContext("config")),
            None => {
                if self.plugin(plugin).is_some() {
                    error!("Plugin '{}' did not register a config callback.", plugin);
                } else {
                    error!(
                        "Cannot configure unknown plugin '{}'. Missing 'LoadPlugin \"{}\"'?",
                        plugin, plugin
                    );
                }
                Err(PluginError::NotFound(plugin.to_string()))
            }
        }
    }

    /// Invoke every init callback; a failing plugin is fully unregistered.
    /// Returns the number of failures.
    pub fn init_all(&self) -> usize {
        let entries: Vec<(String, Option<Arc<PluginContext>>, InitFn)> = {
            let registry = self.init.lock();
            registry
                .entries()
                .iter()
                .map(|e| (e.name.clone(), e.ctx.clone(), Arc::clone(&e.callback)))
                .collect()
        };

        let mut failures = 0;
        for (name, ctx, callback) in entries {
            if callback(ctx.as_ref()).is_err() {
                error!("Failed to initialize plugin '{}'. Unregistering all callbacks.", name);
                if let Some(ctx) = ctx {
                    self.unregister_plugin(ctx.name());
                }
                failures += 1;
            }
        }
        failures
    }

    /// Invoke every shutdown callback. Returns the number of failures.
    pub fn shutdown_all(&self) -> usize {
        let entries: Vec<(String, Option<Arc<PluginContext>>, ShutdownFn)> = {
            let registry = self.shutdown.lock();
            registry
                .entries()
                .iter()
                .map(|e| (e.name.clone(), e.ctx.clone(), Arc::clone(&e.callback)))
                .collect()
        };

        let mut failures = 0;
        for (name, ctx, callback) in entries {
            if callback(ctx.as_ref()).is_err() {
                error!("Failed to shutdown plugin '{}'.", name);
                failures += 1;
            }
        }
        failures
    }

    /// First half of reconfiguration: deconfigure every plugin, zero all
    /// use counts, and unregister every callback. Plugins named by the new
    /// configuration re-register and re-raise their use count.
    pub fn reconfigure_init(&self) {
        let entries: Vec<(Option<Arc<PluginContext>>, ConfigFn)> = {
            let registry = self.config.lock();
            registry.entries().iter().map(|e| (e.ctx.clone(), Arc::clone(&e.callback))).collect()
        };
        for (ctx, callback) in entries {
            if let Some(ctx) = ctx {
                let _ = callback(&ctx, None);
            }
        }

        for ctx in self.plugins.lock().iter() {
            ctx.reset_use();
        }

        self.unregister_all();
    }

    /// Second half of reconfiguration: drop every plugin whose use count
    /// is still zero and close its library.
    pub fn reconfigure_finish(&self) {
        // While splitting the list only the currently visited context is
        // removed; no insertions and no removal of other elements.
        let stale: Vec<Arc<PluginContext>> = {
            let mut plugins = self.plugins.lock();
            let (kept, stale) = std::mem::take(&mut *plugins)
                .into_iter()
                .partition(|ctx: &Arc<PluginContext>| ctx.use_count() > 0);
            *plugins = kept;
            stale
        };

        for ctx in stale {
            info!("Module {} no longer in use", ctx.name());
            self.remove_callbacks(ctx.name());
            ctx.close_library();
        }
    }

    /// Unregister every callback in every registry.
    pub fn unregister_all(&self) {
        let counts = [
            ("config", self.config.lock().clear()),
            ("init", self.init.lock().clear()),
            ("collector", self.collectors.lock().clear()),
            ("cname", self.cname.lock().clear()),
            ("shutdown", self.shutdown.lock().clear()),
            ("log", self.log.lock().clear()),
            ("timeseries fetcher", self.fetchers.lock().clear()),
            ("store writer", self.writers.lock().clear()),
        ];
        for (kind, n) in counts {
            if n > 0 {
                info!("Unregistered {} {} callback{}", n, kind, if n == 1 { "" } else { "s" });
            }
        }
    }

    /// Remove the plugin's callbacks from every registry, drop its context
    /// from the plugin list, and close its library. Fail-closed: used when
    /// a module's init fails.
    pub(crate) fn unregister_plugin(&self, plugin: &str) {
        self.remove_callbacks(plugin);
        let removed = {
            let mut plugins = self.plugins.lock();
            plugins
                .iter()
                .position(|c| c.name().eq_ignore_ascii_case(plugin))
                .map(|pos| plugins.remove(pos))
        };
        if let Some(ctx) = removed {
            ctx.close_library();
        }
    }

    fn remove_callbacks(&self, plugin: &str) {
        self.config.lock().remove_plugin(plugin);
        self.init.lock().remove_plugin(plugin);
        self.collectors.lock().remove_plugin(plugin);
        self.cname.lock().remove_plugin(plugin);
        self.shutdown.lock().remove_plugin(plugin);
        self.log.lock().remove_plugin(plugin);
        self.fetchers.lock().remove_plugin(plugin);
        self.writers.lock().remove_plugin(plugin);
    }

    // --- invocation ------------------------------------------------------

    /// Broadcast a log entry to every log callback. If no plugin-registered
    /// callback consumed it, fall back to standard error.
    pub fn log(&self, priority: Priority, message: &str) {
        let entries: Vec<(bool, LogFn)> = {
            let registry = self.log.lock();
            registry
                .entries()
                .iter()
                .map(|e| (e.ctx.is_some(), Arc::clone(&e.callback)))
                .collect()
        };

        let mut consumed = false;
        for (from_plugin, callback) in entries {
            callback(priority, message);
            if from_plugin {
                consumed = true;
            }
        }
        if !consumed {
            eprintln!("[{priority}] {message}");
        }
    }

    /// Fold a hostname through the cname-rewriter chain.
    pub fn cname(&self, hostname: String) -> String {
        let callbacks: Vec<CnameFn> = {
            let registry = self.cname.lock();
            registry.entries().iter().map(|e| Arc::clone(&e.callback)).collect()
        };

        let mut hostname = hostname;
        for callback in callbacks {
            if let Some(rewritten) = callback(&hostname) {
                hostname = rewritten;
            }
        }
        hostname
    }

    /// Fetch time-series data through the fetcher registered for `fetcher`.
    pub fn fetch_timeseries(
        &self,
        fetcher: &str,
        id: &str,
        opts: &TimeSeriesOpts,
    ) -> Result<TimeSeries, PluginError> {
        let callback = {
            let registry = self.fetchers.lock();
            registry.find(fetcher).map(|e| Arc::clone(&e.callback))
        };
        match callback {
            Some(callback) => callback(id, opts),
            None => {
                error!("Cannot fetch time-series of type {}: no such plugin loaded", fetcher);
                Err(PluginError::NotFound(fetcher.to_string()))
            }
        }
    }

    // --- store write fan-out ---------------------------------------------

    /// Store a host through every registered writer. The name passes
    /// through the cname-rewriter chain first.
    pub fn store_host(&self, name: &str, ts: Timestamp) -> Result<UpdateStatus, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument("host name"));
        }
        let hostname = self.cname(name.to_string());
        self.fan_out(|w| w.store_host(&hostname, ts))
    }

    pub fn store_service(
        &self,
        host: &str,
        name: &str,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if host.is_empty() || name.is_empty() {
            return Err(StoreError::InvalidArgument("service name"));
        }
        self.fan_out(|w| w.store_service(host, name, ts))
    }

    pub fn store_metric(
        &self,
        host: &str,
        name: &str,
        store_ref: Option<MetricStoreRef>,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if host.is_empty() || name.is_empty() {
            return Err(StoreError::InvalidArgument("metric name"));
        }
        let store_ref = store_ref.filter(|r| !r.is_empty());
        self.fan_out(|w| w.store_metric(host, name, store_ref.clone(), ts))
    }

    pub fn store_attribute(
        &self,
        host: &str,
        key: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if host.is_empty() || key.is_empty() {
            return Err(StoreError::InvalidArgument("attribute name"));
        }
        self.fan_out(|w| w.store_attribute(host, key, value.clone(), ts))
    }

    pub fn store_service_attribute(
        &self,
        host: &str,
        service: &str,
        key: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if host.is_empty() || service.is_empty() || key.is_empty() {
            return Err(StoreError::InvalidArgument("attribute name"));
        }
        self.fan_out(|w| w.store_service_attribute(host, service, key, value.clone(), ts))
    }

    pub fn store_metric_attribute(
        &self,
        host: &str,
        metric: &str,
        key: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if host.is_empty() || metric.is_empty() || key.is_empty() {
            return Err(StoreError::InvalidArgument("attribute name"));
        }
        self.fan_out(|w| w.store_metric_attribute(host, metric, key, value.clone(), ts))
    }

    /// Invoke `op` on every writer. The aggregate is an error if any
    /// writer errored, stale if every non-error writer reported stale,
    /// and success otherwise. Every writer is invoked even after a
    /// failure.
    fn fan_out(
        &self,
        op: impl Fn(&dyn StoreWriter) -> Result<UpdateStatus, StoreError>,
    ) -> Result<UpdateStatus, StoreError> {
        let writers: Vec<Arc<dyn StoreWriter>> = {
            let registry = self.writers.lock();
            registry.entries().iter().map(|e| Arc::clone(&e.callback)).collect()
        };

        let mut any_updated = false;
        let mut any_stale = false;
        let mut first_error = None;
        for writer in &writers {
            match op(writer.as_ref()) {
                Ok(UpdateStatus::Updated) => any_updated = true,
                Ok(UpdateStatus::Stale) => any_stale = true,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None if any_stale && !any_updated => Ok(UpdateStatus::Stale),
            None => Ok(UpdateStatus::Updated),
        }
    }

    // --- collector queue access (scheduler) ------------------------------

    pub fn collector_count(&self) -> usize {
        self.collectors.lock().len()
    }

    /// `(name, next_update)` pairs in schedule order.
    pub fn collector_schedule(&self) -> Vec<(String, Timestamp)> {
        self.collectors.lock().schedule()
    }

    pub(crate) fn shift_collector(&self) -> Option<CollectorEntry> {
        self.collectors.lock().shift()
    }

    pub(crate) fn reinsert_collector(&self, entry: CollectorEntry) {
        self.collectors.lock().insert_sorted(entry);
    }
}

fn add_callback<T>(
    registry: &Mutex<Registry<T>>,
    scope: Option<&Arc<PluginContext>>,
    name: &str,
    callback: T,
) -> Result<(), PluginError> {
    if name.is_empty() {
        return Err(PluginError::InvalidArgument("callback name"));
    }
    registry.lock().insert(scoped_name(scope, name), scope.cloned(), callback)
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
