// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sysinvd: the system inventory daemon.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sysinv_daemon::{startup, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let daemon = match startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Startup failed: {e}");
            std::process::exit(1);
        }
    };

    info!("sysinvd {} up and running", env!("CARGO_PKG_VERSION"));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for shutdown signal: {e}");
    }

    daemon.shutdown().await;
}
