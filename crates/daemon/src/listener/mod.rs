// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! handling each one on its own task without blocking the rest of the
//! daemon.

mod commands;
mod conn;

use std::sync::Arc;

use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use sysinv_core::Store;
use sysinv_wire::ProtocolError;

pub(crate) use conn::handle_connection;

/// Shared daemon context for all connection handlers.
pub(crate) struct ListenCtx {
    pub store: Arc<Store>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
    cancel: CancellationToken,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>, cancel: CancellationToken) -> Self {
        Listener { unix, ctx, cancel }
    }

    /// Accept connections until shutdown, spawning a task per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        debug!("Accepted connection");
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            match handle_connection(stream, &ctx).await {
                                Ok(()) => debug!("Closing connection"),
                                Err(e) => error!("Connection error: {}", e),
                            }
                        });
                    }
                    Err(e) => error!("Accept error: {}", e),
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
