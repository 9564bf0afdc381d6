// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, and shutdown.

mod startup;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sysinv_core::{Interval, Store};
use sysinv_plugin::{PluginError, PluginRuntime};

use crate::env;

pub use startup::startup;

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the listening socket.
    pub socket_path: PathBuf,
    /// Base directory for plugin modules.
    pub plugin_dir: PathBuf,
    /// Plugins to load at startup.
    pub plugins: Vec<String>,
    /// Fallback interval for collectors that specify none.
    pub default_interval: Interval,
}

impl Config {
    pub fn from_env() -> Result<Config, LifecycleError> {
        let socket_path = env::socket_path().ok_or(LifecycleError::NoStateDir)?;
        Ok(Config {
            socket_path,
            plugin_dir: env::plugin_dir(),
            plugins: env::plugins(),
            default_interval: env::default_interval(),
        })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot determine state directory (set SYSINV_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("plugin runtime error: {0}")]
    Plugin(#[from] PluginError),
}

/// A running daemon: the store, the plugin runtime, and the background
/// tasks driving them.
pub struct Daemon {
    pub store: Arc<Store>,
    pub runtime: Arc<PluginRuntime>,
    socket_path: PathBuf,
    cancel: CancellationToken,
    listener: JoinHandle<()>,
    collector: Option<JoinHandle<Result<(), PluginError>>>,
}

impl Daemon {
    /// Stop the listener and the collector loop, run every shutdown
    /// callback, and remove the socket.
    pub async fn shutdown(self) {
        info!("Shutting down");
        self.cancel.cancel();
        let _ = self.listener.await;
        if let Some(collector) = self.collector {
            let _ = collector.await;
        }

        let failures = self.runtime.shutdown_all();
        if failures > 0 {
            warn!("{} shutdown callback{} failed", failures, if failures == 1 { "" } else { "s" });
        }

        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
