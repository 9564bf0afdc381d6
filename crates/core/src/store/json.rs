// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON serialization of scan results.
//!
//! The output shape is stable and verified by the fixtures in the tests:
//! one array of host objects, `", "` between keys, `","` between array
//! elements, and child sections omitted when nothing survives filtering.

use std::fmt::Write as _;

use crate::store::entity::{Attribute, Host, Metric, ObjRef, Service};
use crate::store::matcher::Matcher;
use crate::store::ScanItem;
use crate::time::{format_datetime, format_interval, Interval, Timestamp};

/// Streams scan results into a JSON array of host objects.
///
/// `emit` writes the entity itself with no child sections beyond the
/// scanned kind; `emit_full` walks children and applies the filter to
/// them.
pub struct JsonFormatter {
    buf: String,
    first: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        JsonFormatter::new()
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter { buf: String::from("["), first: true }
    }

    /// Emit one scanned item in compact form.
    pub fn emit(&mut self, item: &ScanItem<'_>) {
        self.begin_item();
        match item {
            ScanItem::Host(host) => {
                write_host_open(&mut self.buf, host);
            }
            ScanItem::Services { host, services } => {
                write_host_open(&mut self.buf, host);
                write_section(&mut self.buf, "services", services, |buf, service| {
                    write_service(buf, service, None, false)
                });
            }
            ScanItem::Metrics { host, metrics } => {
                write_host_open(&mut self.buf, host);
                write_section(&mut self.buf, "metrics", metrics, |buf, metric| {
                    write_metric(buf, metric, None, false)
                });
            }
        }
        self.buf.push('}');
    }

    /// Emit one scanned item with child sections, keeping only children
    /// that satisfy `filter`.
    pub fn emit_full(&mut self, item: &ScanItem<'_>, filter: Option<&Matcher>) {
        self.begin_item();
        match item {
            ScanItem::Host(host) => {
                write_host_open(&mut self.buf, host);
                let attributes: Vec<&Attribute> = host
                    .attributes
                    .values()
                    .filter(|a| Matcher::accepts(filter, ObjRef::Attribute(a)))
                    .collect();
                write_section(&mut self.buf, "attributes", &attributes, write_attribute);
                let metrics: Vec<&Metric> = host
                    .metrics
                    .values()
                    .filter(|m| Matcher::accepts(filter, ObjRef::Metric(m)))
                    .collect();
                write_section(&mut self.buf, "metrics", &metrics, |buf, metric| {
                    write_metric(buf, metric, filter, true)
                });
                let services: Vec<&Service> = host
                    .services
                    .values()
                    .filter(|s| Matcher::accepts(filter, ObjRef::Service(s)))
                    .collect();
                write_section(&mut self.buf, "services", &services, |buf, service| {
                    write_service(buf, service, filter, true)
                });
            }
            ScanItem::Services { host, services } => {
                write_host_open(&mut self.buf, host);
                let services: Vec<&Service> = services
                    .iter()
                    .filter(|s| Matcher::accepts(filter, ObjRef::Service(s)))
                    .copied()
                    .collect();
                write_section(&mut self.buf, "services", &services, |buf, service| {
                    write_service(buf, service, filter, true)
                });
            }
            ScanItem::Metrics { host, metrics } => {
                write_host_open(&mut self.buf, host);
                let metrics: Vec<&Metric> = metrics
                    .iter()
                    .filter(|m| Matcher::accepts(filter, ObjRef::Metric(m)))
                    .copied()
                    .collect();
                write_section(&mut self.buf, "metrics", &metrics, |buf, metric| {
                    write_metric(buf, metric, filter, true)
                });
            }
        }
        self.buf.push('}');
    }

    /// Close the array and return the serialized document.
    pub fn finish(mut self) -> String {
        self.buf.push(']');
        self.buf
    }

    fn begin_item(&mut self) {
        if !self.first {
            self.buf.push(',');
        }
        self.first = false;
    }
}

/// JSON-escape `s` into `buf`, including the surrounding quotes.
pub(crate) fn write_escaped(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

fn write_stamp(buf: &mut String, last_update: Timestamp, interval: Interval, backends: &[String]) {
    buf.push_str(", \"last_update\": ");
    write_escaped(buf, &format_datetime(last_update));
    buf.push_str(", \"update_interval\": ");
    write_escaped(buf, &format_interval(interval));
    buf.push_str(", \"backends\": [");
    for (i, backend) in backends.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        write_escaped(buf, backend);
    }
    buf.push(']');
}

fn write_host_open(buf: &mut String, host: &Host) {
    buf.push_str("{\"name\": ");
    write_escaped(buf, &host.name);
    write_stamp(buf, host.last_update, host.update_interval, &host.backends);
}

fn write_attribute(buf: &mut String, attr: &&Attribute) {
    buf.push_str("{\"name\": ");
    write_escaped(buf, &attr.name);
    buf.push_str(", \"value\": ");
    attr.value.write_json(buf);
    write_stamp(buf, attr.last_update, attr.update_interval, &attr.backends);
    buf.push('}');
}

fn write_service(buf: &mut String, service: &Service, filter: Option<&Matcher>, full: bool) {
    buf.push_str("{\"name\": ");
    write_escaped(buf, &service.name);
    write_stamp(buf, service.last_update, service.update_interval, &service.backends);
    if full {
        let attributes: Vec<&Attribute> = service
            .attributes
            .values()
            .filter(|a| Matcher::accepts(filter, ObjRef::Attribute(a)))
            .collect();
        write_section(buf, "attributes", &attributes, write_attribute);
    }
    buf.push('}');
}

fn write_metric(buf: &mut String, metric: &Metric, filter: Option<&Matcher>, full: bool) {
    buf.push_str("{\"name\": ");
    write_escaped(buf, &metric.name);
    buf.push_str(", \"timeseries\": ");
    buf.push_str(if metric.store_ref.is_some() { "true" } else { "false" });
    write_stamp(buf, metric.last_update, metric.update_interval, &metric.backends);
    if full {
        let attributes: Vec<&Attribute> = metric
            .attributes
            .values()
            .filter(|a| Matcher::accepts(filter, ObjRef::Attribute(a)))
            .collect();
        write_section(buf, "attributes", &attributes, write_attribute);
    }
    buf.push('}');
}

/// Write `, "<label>": [...]` unless `items` is empty.
fn write_section<T>(buf: &mut String, label: &str, items: &[T], write: impl Fn(&mut String, &T)) {
    if items.is_empty() {
        return;
    }
    buf.push_str(", \"");
    buf.push_str(label);
    buf.push_str("\": [");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        write(buf, item);
    }
    buf.push(']');
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
