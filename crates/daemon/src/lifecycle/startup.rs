// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::sync::Arc;

use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sysinv_core::{Store, StoreWriter};
use sysinv_plugin::{collector_loop, PluginRuntime, Priority};

use crate::listener::{ListenCtx, Listener};

use super::{Config, Daemon, LifecycleError};

/// Start the daemon: bind the socket, wire the store into the plugin
/// runtime, load the configured plugins, and spawn the background tasks.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // A leftover socket from an unclean shutdown would fail the bind.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let unix = UnixListener::bind(&config.socket_path)?;
    info!("Listening on {}", config.socket_path.display());

    let store = Arc::new(Store::new());
    let runtime = Arc::new(PluginRuntime::new());

    // The in-memory store is just another registered writer.
    runtime.register_writer(None, "memory", Arc::clone(&store) as Arc<dyn StoreWriter>)?;
    // Bridge the plugin log fan-out into the daemon's own logging.
    runtime.register_log(None, "tracing", Arc::new(forward_to_tracing))?;

    for name in &config.plugins {
        if let Err(e) = runtime.load(&config.plugin_dir, name, None) {
            error!("Failed to load plugin '{}': {}", name, e);
        }
    }

    let failures = runtime.init_all();
    if failures > 0 {
        warn!("{} plugin{} failed to initialize", failures, if failures == 1 { "" } else { "s" });
    }

    let cancel = CancellationToken::new();

    let ctx = Arc::new(ListenCtx { store: Arc::clone(&store) });
    let listener = tokio::spawn(Listener::new(unix, ctx, cancel.clone()).run());

    let collector = if runtime.collector_count() > 0 {
        Some(tokio::spawn(collector_loop(
            Arc::clone(&runtime),
            config.default_interval,
            cancel.clone(),
        )))
    } else {
        info!("No collectors registered; scheduler not started");
        None
    };

    Ok(Daemon {
        store,
        runtime,
        socket_path: config.socket_path.clone(),
        cancel,
        listener,
        collector,
    })
}

fn forward_to_tracing(priority: Priority, message: &str) {
    match priority {
        Priority::Emerg | Priority::Err => error!("{message}"),
        Priority::Warning => warn!("{message}"),
        Priority::Notice | Priority::Info => info!("{message}"),
        Priority::Debug => tracing::debug!("{message}"),
    }
}
