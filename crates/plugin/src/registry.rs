// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback registries.
//!
//! Each registry is an insertion-ordered list of named callback records;
//! names are unique per registry under case-insensitive comparison.

use std::sync::Arc;

use tracing::{info, warn};

use sysinv_core::{Interval, TimeSeries, TimeSeriesOpts, Timestamp};

use crate::context::PluginContext;
use crate::error::PluginError;
use crate::info::ConfigItem;
use crate::log::Priority;

/// Config callback; `None` signals "deconfigure".
pub type ConfigFn =
    Arc<dyn Fn(&Arc<PluginContext>, Option<&ConfigItem>) -> Result<(), PluginError> + Send + Sync>;

/// Init callback, invoked after all plugins are configured.
pub type InitFn =
    Arc<dyn Fn(Option<&Arc<PluginContext>>) -> Result<(), PluginError> + Send + Sync>;

/// Shutdown callback, invoked at teardown.
pub type ShutdownFn =
    Arc<dyn Fn(Option<&Arc<PluginContext>>) -> Result<(), PluginError> + Send + Sync>;

/// Log callback, invoked for every fan-out log entry.
pub type LogFn = Arc<dyn Fn(Priority, &str) + Send + Sync>;

/// Canonical-hostname rewriter; `None` leaves the name unchanged.
pub type CnameFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Time-series fetcher, dispatched by the fetcher-type of a metric's
/// store-ref.
pub type FetchFn =
    Arc<dyn Fn(&str, &TimeSeriesOpts) -> Result<TimeSeries, PluginError> + Send + Sync>;

/// Collector body. The scheduler owns the record while it runs, so the
/// callback may carry mutable state.
pub type CollectorFn =
    Box<dyn FnMut(Option<&Arc<PluginContext>>) -> Result<(), PluginError> + Send>;

/// One registered callback.
pub(crate) struct Entry<T> {
    pub name: String,
    pub ctx: Option<Arc<PluginContext>>,
    pub callback: T,
}

pub(crate) struct Registry<T> {
    kind: &'static str,
    entries: Vec<Entry<T>>,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Registry { kind, entries: Vec::new() }
    }

    pub fn find(&self, name: &str) -> Option<&Entry<T>> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    pub fn insert(
        &mut self,
        name: String,
        ctx: Option<Arc<PluginContext>>,
        callback: T,
    ) -> Result<(), PluginError> {
        if self.find(&name).is_some() {
            warn!(
                "{} callback {:?} has already been registered. \
                 Ignoring newly registered version.",
                self.kind, name
            );
            return Err(PluginError::Duplicate { kind: self.kind, name });
        }
        info!("Registered {} callback {:?}.", self.kind, name);
        self.entries.push(Entry { name, ctx, callback });
        Ok(())
    }

    /// Drop every record registered by `plugin`; returns how many.
    pub fn remove_plugin(&mut self, plugin: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| match &e.ctx {
            Some(ctx) if ctx.name().eq_ignore_ascii_case(plugin) => {
                info!(
                    "Unregistering {} callback {:?} (module {})",
                    self.kind,
                    e.name,
                    ctx.name()
                );
                false
            }
            _ => true,
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) -> usize {
        let len = self.entries.len();
        self.entries.clear();
        len
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }
}

/// A collector record: a callback plus its schedule.
pub(crate) struct CollectorEntry {
    pub name: String,
    pub ctx: Option<Arc<PluginContext>>,
    pub callback: CollectorFn,
    pub interval: Interval,
    pub next_update: Timestamp,
}

/// The collector registry, kept sorted by `next_update` so the head is
/// always the earliest due record.
#[derive(Default)]
pub(crate) struct CollectorQueue {
    entries: Vec<CollectorEntry>,
}

impl CollectorQueue {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Insert keeping the sort stable: equal `next_update` records stay in
    /// registration order.
    pub fn insert_sorted(&mut self, entry: CollectorEntry) {
        let pos = self.entries.partition_point(|e| e.next_update <= entry.next_update);
        self.entries.insert(pos, entry);
    }

    /// Remove and return the earliest due record.
    pub fn shift(&mut self) -> Option<CollectorEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(name, next_update)` pairs in queue order.
    pub fn schedule(&self) -> Vec<(String, Timestamp)> {
        self.entries.iter().map(|e| (e.name.clone(), e.next_update)).collect()
    }

    pub fn remove_plugin(&mut self, plugin: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| match &e.ctx {
            Some(ctx) if ctx.name().eq_ignore_ascii_case(plugin) => {
                info!(
                    "Unregistering collector callback {:?} (module {})",
                    e.name,
                    ctx.name()
                );
                false
            }
            _ => true,
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) -> usize {
        let len = self.entries.len();
        self.entries.clear();
        len
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
