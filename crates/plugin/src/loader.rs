// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamic module loading.
//!
//! A plugin named `a::b::c` lives at `<basedir>/a/b/c.<dylib-ext>`. The
//! loader opens the library, resolves [`MODULE_INIT_SYMBOL`], and invokes
//! it with a [`ModuleRegistrar`]. The registrar carries the plugin's
//! context explicitly; registrations made through it are attributed to
//! that context.

use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};
use tracing::{error, info, warn};

use sysinv_core::Interval;

use crate::context::PluginContext;
use crate::error::PluginError;
use crate::info::{ConfigItem, PluginConfig};
use crate::log::Priority;
use crate::registry::{CnameFn, CollectorFn, ConfigFn, FetchFn, InitFn, LogFn, ShutdownFn};
use crate::runtime::PluginRuntime;
use crate::{version_decode, DAEMON_VERSION};

/// Name of the exported module entry point.
pub const MODULE_INIT_SYMBOL: &[u8] = b"sysinv_module_init\0";

/// Signature of the module entry point. A nonzero return aborts the load.
pub type ModuleInitFn = unsafe extern "C" fn(*mut ModuleRegistrar) -> c_int;

/// Handed to a module's init function. Wraps the runtime and the module's
/// own context; every registration made through it is attributed to that
/// context.
pub struct ModuleRegistrar {
    runtime: Arc<PluginRuntime>,
    ctx: Arc<PluginContext>,
}

impl ModuleRegistrar {
    pub fn set_description(&self, description: &str) {
        self.ctx.update_info(|info| info.set_description(description));
    }

    pub fn set_copyright(&self, copyright: &str) {
        self.ctx.update_info(|info| info.set_copyright(copyright));
    }

    pub fn set_license(&self, license: &str) {
        self.ctx.update_info(|info| info.set_license(license));
    }

    /// Daemon protocol version the module was built against.
    pub fn set_version(&self, version: i32) {
        self.ctx.update_info(|info| info.set_version(version));
    }

    pub fn set_plugin_version(&self, version: i32) {
        self.ctx.update_info(|info| info.set_plugin_version(version));
    }

    /// The module's public config block.
    pub fn config(&self) -> PluginConfig {
        self.ctx.config()
    }

    pub fn set_config(&self, config: PluginConfig) {
        self.ctx.set_config(config);
    }

    pub fn register_config(
        &self,
        callback: impl Fn(&Arc<PluginContext>, Option<&ConfigItem>) -> Result<(), PluginError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), PluginError> {
        self.runtime.register_config(Some(&self.ctx), Arc::new(callback) as ConfigFn)
    }

    pub fn register_init(
        &self,
        name: &str,
        callback: impl Fn(Option<&Arc<PluginContext>>) -> Result<(), PluginError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), PluginError> {
        self.runtime.register_init(Some(&self.ctx), name, Arc::new(callback) as InitFn)
    }

    pub fn register_shutdown(
        &self,
        name: &str,
        callback: impl Fn(Option<&Arc<PluginContext>>) -> Result<(), PluginError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), PluginError> {
        self.runtime.register_shutdown(Some(&self.ctx), name, Arc::new(callback) as ShutdownFn)
    }

    pub fn register_log(
        &self,
        name: &str,
        callback: impl Fn(Priority, &str) + Send + Sync + 'static,
    ) -> Result<(), PluginError> {
        self.runtime.register_log(Some(&self.ctx), name, Arc::new(callback) as LogFn)
    }

    pub fn register_cname(
        &self,
        name: &str,
        callback: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Result<(), PluginError> {
        self.runtime.register_cname(Some(&self.ctx), name, Arc::new(callback) as CnameFn)
    }

    pub fn register_collector(
        &self,
        name: &str,
        interval: Option<Interval>,
        callback: CollectorFn,
    ) -> Result<(), PluginError> {
        self.runtime.register_collector(Some(&self.ctx), name, interval, callback)
    }

    pub fn register_fetcher(
        &self,
        fetcher_type: &str,
        callback: FetchFn,
    ) -> Result<(), PluginError> {
        self.runtime.register_fetcher(Some(&self.ctx), fetcher_type, callback)
    }

    pub fn register_writer(
        &self,
        name: &str,
        writer: Arc<dyn sysinv_core::StoreWriter>,
    ) -> Result<(), PluginError> {
        self.runtime.register_writer(Some(&self.ctx), name, writer)
    }
}

/// Map a plugin name to its library path under `basedir`.
pub(crate) fn module_path(basedir: &Path, name: &str) -> PathBuf {
    let rel = name.replace("::", "/");
    basedir.join(format!("{rel}.{}", std::env::consts::DLL_EXTENSION))
}

/// Load the named plugin, or re-run its init when it is already loaded
/// with a zero use count. Raises the use count either way.
pub(crate) fn load(
    runtime: &Arc<PluginRuntime>,
    basedir: &Path,
    name: &str,
    config: Option<PluginConfig>,
) -> Result<(), PluginError> {
    if name.is_empty() {
        return Err(PluginError::InvalidArgument("plugin name"));
    }

    if let Some(ctx) = runtime.plugin(name) {
        if ctx.use_count() == 0 {
            module_init(runtime, &ctx)?;
            info!(
                "Successfully reloaded plugin '{}' ({})",
                ctx.name(),
                ctx.info().description()
            );
        }
        ctx.raise_use();
        return Ok(());
    }

    module_load(runtime, basedir, name, config)
}

fn module_load(
    runtime: &Arc<PluginRuntime>,
    basedir: &Path,
    name: &str,
    config: Option<PluginConfig>,
) -> Result<(), PluginError> {
    let filename = module_path(basedir, name);
    if !filename.is_file() {
        error!("Failed to load plugin '{}' ({}): no such file", name, filename.display());
        return Err(PluginError::ModuleMissing(filename));
    }

    // SAFETY: loading a shared object runs its initializers; the module is
    // part of the deployment and trusted like the daemon binary itself.
    let library = unsafe { Library::new(&filename) }.map_err(|e| {
        error!(
            "Failed to load plugin '{}': {}. The most common cause for this \
             problem are missing dependencies.",
            name, e
        );
        PluginError::ModuleLoad { name: name.to_string(), source: e }
    })?;

    let ctx = PluginContext::new(name, filename, Some(library), config.unwrap_or_default());
    module_init(runtime, &ctx)?;

    let info = ctx.info();
    match info.version() {
        Some(version) if version / 100 == DAEMON_VERSION / 100 => {}
        version => {
            let (major, minor, patch) = version_decode(version.unwrap_or(-1));
            let (our_major, our_minor, our_patch) = version_decode(DAEMON_VERSION);
            warn!(
                "version of plugin '{}' ({}.{}.{}) does not match our version \
                 ({}.{}.{}); this might cause problems",
                name, major, minor, patch, our_major, our_minor, our_patch
            );
        }
    }

    runtime.add_plugin(Arc::clone(&ctx));

    info!(
        "Successfully loaded plugin {} v{} ({})",
        name,
        info.plugin_version().unwrap_or(0),
        info.description()
    );
    info!("Plugin {}: {}, License: {}", name, info.copyright(), info.license());
    Ok(())
}

/// Resolve and invoke the module's init symbol. On failure the plugin's
/// callbacks registered so far are unregistered (fail-closed).
fn module_init(runtime: &Arc<PluginRuntime>, ctx: &Arc<PluginContext>) -> Result<(), PluginError> {
    let name = ctx.name().to_string();

    let status = ctx.with_library(|library| -> Result<c_int, PluginError> {
        let library = library.ok_or(PluginError::Internal("module library already closed"))?;

        // SAFETY: the symbol type is fixed by the module ABI contract.
        let init: Symbol<'_, ModuleInitFn> =
            unsafe { library.get(MODULE_INIT_SYMBOL) }.map_err(|e| {
                error!(
                    "Failed to load plugin '{}': could not find symbol 'sysinv_module_init'",
                    name
                );
                PluginError::ModuleLoad { name: name.clone(), source: e }
            })?;

        let mut registrar =
            ModuleRegistrar { runtime: Arc::clone(runtime), ctx: Arc::clone(ctx) };
        // SAFETY: the registrar outlives the call; modules must not retain
        // the pointer past their init function.
        Ok(unsafe { init(&mut registrar as *mut ModuleRegistrar) })
    })?;

    if status != 0 {
        error!("Failed to initialize module '{}'", name);
        runtime.unregister_plugin(&name);
        return Err(PluginError::ModuleInit { name, status });
    }
    Ok(())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
