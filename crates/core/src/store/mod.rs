// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory inventory.
//!
//! The store owns the host tree behind a single read/write lock: writes are
//! serialized so the monotonic last-update check is atomic with the update,
//! and scans observe a consistent snapshot for their whole duration.

pub mod entity;
pub mod json;
pub mod matcher;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::status::{StoreError, UpdateStatus};
use crate::time::Timestamp;
use crate::value::Value;
use entity::{key, stamp, Attribute, EntityKind, Host, Metric, MetricStoreRef, ObjRef, Service};
use matcher::{MatchError, Matcher};

/// The six store operations every writer backend implements.
///
/// A stale return is positive: the write was understood but superseded by
/// newer data already present.
pub trait StoreWriter: Send + Sync {
    fn store_host(&self, name: &str, ts: Timestamp) -> Result<UpdateStatus, StoreError>;

    fn store_service(
        &self,
        host: &str,
        name: &str,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError>;

    fn store_metric(
        &self,
        host: &str,
        name: &str,
        store_ref: Option<MetricStoreRef>,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError>;

    fn store_attribute(
        &self,
        host: &str,
        key: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError>;

    fn store_service_attribute(
        &self,
        host: &str,
        service: &str,
        key: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError>;

    fn store_metric_attribute(
        &self,
        host: &str,
        metric: &str,
        key: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError>;
}

/// One host (and a selection of its children) handed to a scan callback.
#[derive(Debug)]
pub enum ScanItem<'a> {
    Host(&'a Host),
    Services { host: &'a Host, services: Vec<&'a Service> },
    Metrics { host: &'a Host, metrics: Vec<&'a Metric> },
}

impl ScanItem<'_> {
    pub fn host(&self) -> &Host {
        match self {
            ScanItem::Host(host) => host,
            ScanItem::Services { host, .. } => host,
            ScanItem::Metrics { host, .. } => host,
        }
    }
}

#[derive(Default)]
struct State {
    hosts: IndexMap<String, Host>,
}

/// The in-memory inventory of hosts, services, metrics, and attributes.
#[derive(Default)]
pub struct Store {
    state: RwLock<State>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Run `f` against a host, if present.
    pub fn with_host<R>(&self, name: &str, f: impl FnOnce(&Host) -> R) -> Option<R> {
        let state = self.state.read();
        state.hosts.get(&key(name)).map(f)
    }

    pub fn host_count(&self) -> usize {
        self.state.read().hosts.len()
    }

    /// Drop the whole inventory. Test fixtures only; the daemon never
    /// deletes entities.
    pub fn clear(&self) {
        self.state.write().hosts.clear();
    }

    /// Visit the inventory.
    ///
    /// Hosts are visited in insertion order; a host that fails `filter` is
    /// skipped entirely. For a host scan, `matcher` is evaluated against
    /// the host itself. For service and metric scans it is evaluated
    /// against every child of that kind, and hosts with at least one match
    /// produce one callback invocation carrying exactly the matching
    /// children. The filter is passed through for the serializer to
    /// restrict what it emits. An attribute kind visits nothing.
    pub fn scan(
        &self,
        kind: EntityKind,
        matcher: Option<&Matcher>,
        filter: Option<&Matcher>,
        visit: &mut dyn FnMut(ScanItem<'_>, Option<&Matcher>),
    ) -> Result<(), MatchError> {
        let state = self.state.read();
        for host in state.hosts.values() {
            if !Matcher::accepts(filter, ObjRef::Host(host)) {
                continue;
            }
            match kind {
                EntityKind::Host => {
                    let matched = match matcher {
                        None => true,
                        Some(m) => m.evaluate(ObjRef::Host(host))?,
                    };
                    if matched {
                        visit(ScanItem::Host(host), filter);
                    }
                }
                EntityKind::Service => {
                    let mut services = Vec::new();
                    for service in host.services.values() {
                        let matched = match matcher {
                            None => true,
                            Some(m) => m.evaluate(ObjRef::Service(service))?,
                        };
                        if matched {
                            services.push(service);
                        }
                    }
                    if !services.is_empty() {
                        visit(ScanItem::Services { host, services }, filter);
                    }
                }
                EntityKind::Metric => {
                    let mut metrics = Vec::new();
                    for metric in host.metrics.values() {
                        let matched = match matcher {
                            None => true,
                            Some(m) => m.evaluate(ObjRef::Metric(metric))?,
                        };
                        if matched {
                            metrics.push(metric);
                        }
                    }
                    if !metrics.is_empty() {
                        visit(ScanItem::Metrics { host, metrics }, filter);
                    }
                }
                EntityKind::Attribute => {}
            }
        }
        Ok(())
    }
}

fn host_mut<'a>(state: &'a mut State, host: &str) -> Result<&'a mut Host, StoreError> {
    state
        .hosts
        .get_mut(&key(host))
        .ok_or_else(|| StoreError::not_found(EntityKind::Host, host))
}

fn store_attr(
    attributes: &mut IndexMap<String, Attribute>,
    name: &str,
    value: Value,
    ts: Timestamp,
) -> UpdateStatus {
    match attributes.get_mut(&key(name)) {
        Some(attr) => {
            let status = stamp(&mut attr.last_update, &mut attr.update_interval, ts);
            if status == UpdateStatus::Updated {
                attr.value = value;
            }
            status
        }
        None => {
            attributes.insert(key(name), Attribute::new(name, value, ts));
            UpdateStatus::Updated
        }
    }
}

impl StoreWriter for Store {
    fn store_host(&self, name: &str, ts: Timestamp) -> Result<UpdateStatus, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument("host name"));
        }
        let mut state = self.state.write();
        match state.hosts.get_mut(&key(name)) {
            Some(host) => Ok(stamp(&mut host.last_update, &mut host.update_interval, ts)),
            None => {
                state.hosts.insert(key(name), Host::new(name, ts));
                Ok(UpdateStatus::Updated)
            }
        }
    }

    fn store_service(
        &self,
        host: &str,
        name: &str,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument("service name"));
        }
        let mut state = self.state.write();
        let host = host_mut(&mut state, host)?;
        match host.services.get_mut(&key(name)) {
            Some(service) => {
                Ok(stamp(&mut service.last_update, &mut service.update_interval, ts))
            }
            None => {
                host.services.insert(key(name), Service::new(name, ts));
                Ok(UpdateStatus::Updated)
            }
        }
    }

    fn store_metric(
        &self,
        host: &str,
        name: &str,
        store_ref: Option<MetricStoreRef>,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidArgument("metric name"));
        }
        let store_ref = store_ref.filter(|r| !r.is_empty());
        let mut state = self.state.write();
        let host = host_mut(&mut state, host)?;
        match host.metrics.get_mut(&key(name)) {
            Some(metric) => {
                let status = stamp(&mut metric.last_update, &mut metric.update_interval, ts);
                if status == UpdateStatus::Updated && store_ref.is_some() {
                    metric.store_ref = store_ref;
                }
                Ok(status)
            }
            None => {
                host.metrics.insert(key(name), Metric::new(name, store_ref, ts));
                Ok(UpdateStatus::Updated)
            }
        }
    }

    fn store_attribute(
        &self,
        host: &str,
        key_name: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if key_name.is_empty() {
            return Err(StoreError::InvalidArgument("attribute name"));
        }
        let mut state = self.state.write();
        let host = host_mut(&mut state, host)?;
        Ok(store_attr(&mut host.attributes, key_name, value, ts))
    }

    fn store_service_attribute(
        &self,
        host: &str,
        service: &str,
        key_name: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if key_name.is_empty() {
            return Err(StoreError::InvalidArgument("attribute name"));
        }
        let mut state = self.state.write();
        let host = host_mut(&mut state, host)?;
        let service = host
            .services
            .get_mut(&key(service))
            .ok_or_else(|| StoreError::not_found(EntityKind::Service, service))?;
        Ok(store_attr(&mut service.attributes, key_name, value, ts))
    }

    fn store_metric_attribute(
        &self,
        host: &str,
        metric: &str,
        key_name: &str,
        value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        if key_name.is_empty() {
            return Err(StoreError::InvalidArgument("attribute name"));
        }
        let mut state = self.state.write();
        let host = host_mut(&mut state, host)?;
        let metric = host
            .metrics
            .get_mut(&key(metric))
            .ok_or_else(|| StoreError::not_found(EntityKind::Metric, metric))?;
        Ok(store_attr(&mut metric.attributes, key_name, value, ts))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
