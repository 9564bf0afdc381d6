// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-plugin context.
//!
//! Every callback a plugin registers holds a strong reference to its
//! context. The *use count* is separate from the reference count: it
//! tracks how many times the plugin was named by the configuration, and
//! drives unloading during reconfiguration.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::info::{PluginConfig, PluginInfo};

#[derive(Debug)]
pub struct PluginContext {
    name: String,
    filename: PathBuf,
    info: Mutex<PluginInfo>,
    config: Mutex<PluginConfig>,
    library: Mutex<Option<Library>>,
    use_count: AtomicUsize,
}

impl PluginContext {
    pub(crate) fn new(
        name: &str,
        filename: PathBuf,
        library: Option<Library>,
        config: PluginConfig,
    ) -> Arc<Self> {
        Arc::new(PluginContext {
            name: name.to_string(),
            filename,
            info: Mutex::new(PluginInfo::default()),
            config: Mutex::new(config),
            library: Mutex::new(library),
            use_count: AtomicUsize::new(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Snapshot of the plugin metadata.
    pub fn info(&self) -> PluginInfo {
        self.info.lock().clone()
    }

    pub(crate) fn update_info(&self, f: impl FnOnce(&mut PluginInfo)) {
        f(&mut self.info.lock());
    }

    /// The public per-plugin config block.
    pub fn config(&self) -> PluginConfig {
        *self.config.lock()
    }

    pub fn set_config(&self, config: PluginConfig) {
        *self.config.lock() = config;
    }

    pub fn use_count(&self) -> usize {
        self.use_count.load(Ordering::Relaxed)
    }

    pub(crate) fn raise_use(&self) {
        self.use_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset_use(&self) {
        self.use_count.store(0, Ordering::Relaxed);
    }

    pub(crate) fn with_library<R>(&self, f: impl FnOnce(Option<&Library>) -> R) -> R {
        f(self.library.lock().as_ref())
    }

    /// Unload the module's shared library, if still open.
    pub(crate) fn close_library(&self) {
        if let Some(library) = self.library.lock().take() {
            info!("Unloading module {}", self.name);
            if let Err(e) = library.close() {
                warn!("Failed to unload module {}: {}", self.name, e);
            }
        }
    }
}
