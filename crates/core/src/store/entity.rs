// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store entities: hosts, services, metrics, and attributes.
//!
//! Entities form an ownership tree. A host owns its services, metrics, and
//! host attributes; services and metrics own their attribute sets. Child
//! collections preserve insertion order and key children by their
//! lower-cased name.

use std::fmt;

use indexmap::IndexMap;

use crate::time::{Interval, Timestamp};
use crate::value::Value;

/// Kinds of store entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Host,
    Service,
    Metric,
    Attribute,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Host => "host",
            EntityKind::Service => "service",
            EntityKind::Metric => "metric",
            EntityKind::Attribute => "attribute",
        };
        write!(f, "{s}")
    }
}

/// Child-map key: case-insensitive name comparison.
pub(crate) fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Locates external time-series data for a metric: the fetcher type it was
/// registered under plus an opaque identifier the fetcher understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricStoreRef {
    pub fetcher: String,
    pub id: String,
}

impl MetricStoreRef {
    /// A store-ref with an empty fetcher type or id carries no information.
    pub fn is_empty(&self) -> bool {
        self.fetcher.is_empty() || self.id.is_empty()
    }
}

/// A typed key/value attribute on a host, service, or metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
    pub last_update: Timestamp,
    pub update_interval: Interval,
    pub backends: Vec<String>,
}

impl Attribute {
    pub(crate) fn new(name: &str, value: Value, ts: Timestamp) -> Self {
        Attribute {
            name: name.to_string(),
            value,
            last_update: ts,
            update_interval: 0,
            backends: Vec::new(),
        }
    }
}

/// A service running on a host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Service {
    pub name: String,
    pub attributes: IndexMap<String, Attribute>,
    pub last_update: Timestamp,
    pub update_interval: Interval,
    pub backends: Vec<String>,
}

impl Service {
    pub(crate) fn new(name: &str, ts: Timestamp) -> Self {
        Service { name: name.to_string(), last_update: ts, ..Default::default() }
    }
}

/// A metric reported for a host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metric {
    pub name: String,
    pub store_ref: Option<MetricStoreRef>,
    pub attributes: IndexMap<String, Attribute>,
    pub last_update: Timestamp,
    pub update_interval: Interval,
    pub backends: Vec<String>,
}

impl Metric {
    pub(crate) fn new(name: &str, store_ref: Option<MetricStoreRef>, ts: Timestamp) -> Self {
        Metric {
            name: name.to_string(),
            store_ref,
            last_update: ts,
            ..Default::default()
        }
    }
}

/// A host and everything reported for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Host {
    pub name: String,
    pub services: IndexMap<String, Service>,
    pub metrics: IndexMap<String, Metric>,
    pub attributes: IndexMap<String, Attribute>,
    pub last_update: Timestamp,
    pub update_interval: Interval,
    pub backends: Vec<String>,
}

impl Host {
    pub(crate) fn new(name: &str, ts: Timestamp) -> Self {
        Host { name: name.to_string(), last_update: ts, ..Default::default() }
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(&key(name))
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(&key(name))
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(&key(name))
    }
}

/// Advance an entity's update stamp.
///
/// Returns stale without touching anything when `ts` is not newer. The
/// interval is refreshed only from a previously known stamp.
pub(crate) fn stamp(
    last_update: &mut Timestamp,
    update_interval: &mut Interval,
    ts: Timestamp,
) -> crate::status::UpdateStatus {
    use crate::status::UpdateStatus;

    if *last_update >= ts {
        return UpdateStatus::Stale;
    }
    if *last_update != 0 {
        *update_interval = ts - *last_update;
    }
    *last_update = ts;
    UpdateStatus::Updated
}

/// A borrowed reference to any store entity, for matcher evaluation.
#[derive(Debug, Clone, Copy)]
pub enum ObjRef<'a> {
    Host(&'a Host),
    Service(&'a Service),
    Metric(&'a Metric),
    Attribute(&'a Attribute),
}

impl ObjRef<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            ObjRef::Host(_) => EntityKind::Host,
            ObjRef::Service(_) => EntityKind::Service,
            ObjRef::Metric(_) => EntityKind::Metric,
            ObjRef::Attribute(_) => EntityKind::Attribute,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ObjRef::Host(h) => &h.name,
            ObjRef::Service(s) => &s.name,
            ObjRef::Metric(m) => &m.name,
            ObjRef::Attribute(a) => &a.name,
        }
    }

    pub fn last_update(&self) -> Timestamp {
        match self {
            ObjRef::Host(h) => h.last_update,
            ObjRef::Service(s) => s.last_update,
            ObjRef::Metric(m) => m.last_update,
            ObjRef::Attribute(a) => a.last_update,
        }
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
