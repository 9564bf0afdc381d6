// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The collector scheduler.
//!
//! Collectors are cooperatively single-threaded: the loop shifts the
//! earliest due record out of the sorted queue, waits until it is due,
//! runs it, advances its schedule, and re-inserts it. No registry lock is
//! held while a callback executes.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sysinv_core::time;
use sysinv_core::Interval;

use crate::error::PluginError;
use crate::runtime::PluginRuntime;

/// Drive the collector queue until `cancel` fires.
///
/// `default_interval` applies to records whose own interval is zero; a
/// record with neither is dropped from scheduling with a warning. Returns
/// an error when no collectors are registered.
pub async fn collector_loop(
    runtime: Arc<PluginRuntime>,
    default_interval: Interval,
    cancel: CancellationToken,
) -> Result<(), PluginError> {
    if runtime.collector_count() == 0 {
        warn!("No collectors registered. Quitting collector loop.");
        return Err(PluginError::NoCollectors);
    }

    while !cancel.is_cancelled() {
        let Some(mut entry) = runtime.shift_collector() else {
            return Err(PluginError::NoCollectors);
        };

        let now = time::now();
        if entry.next_update > now {
            let wait = Duration::from_nanos(entry.next_update - now);
            tokio::select! {
                _ = cancel.cancelled() => {
                    // Put the record back; the schedule survives a stop.
                    runtime.reinsert_collector(entry);
                    return Ok(());
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        debug!("Running collector {:?}", entry.name);
        // Collectors log their own failures; the status is not acted upon.
        let _ = (entry.callback)(entry.ctx.as_ref());

        let interval = if entry.interval != 0 { entry.interval } else { default_interval };
        if interval == 0 {
            warn!(
                "No interval configured for collector {:?}; \
                 skipping any further iterations.",
                entry.name
            );
            continue;
        }

        entry.next_update += interval;
        let now = time::now();
        if now > entry.next_update {
            warn!("Collector {:?} took too long; skipping iterations to keep up.", entry.name);
            entry.next_update = now;
        }

        runtime.reinsert_collector(entry);
    }
    Ok(())
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
