// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use crate::status::UpdateStatus;
use crate::store::entity::EntityKind;
use crate::store::matcher::{CmpOp, Field};
use crate::store::{Store, StoreWriter};
use crate::value::Value;

// Common stamp for every fixture entity: sub-second timestamps, no
// interval, no tracked backends.
const STAMP: &str =
    "\"last_update\": \"1970-01-01 00:00:00 +0000\", \"update_interval\": \"0s\", \"backends\": []";

fn populate() -> Store {
    let store = Store::new();

    store.store_host("h1", 1).unwrap();
    store.store_host("h2", 3).unwrap();

    store.store_attribute("h1", "k1", "v1".into(), 1).unwrap();
    store.store_attribute("h1", "k2", "v2".into(), 2).unwrap();
    store.store_attribute("h1", "k3", "v3".into(), 2).unwrap();

    // Older updates must not overwrite existing values.
    assert_eq!(
        store.store_attribute("h1", "k2", "fail".into(), 1).unwrap(),
        UpdateStatus::Stale
    );
    assert_eq!(
        store.store_attribute("h1", "k3", "fail".into(), 2).unwrap(),
        UpdateStatus::Stale
    );

    store.store_metric("h1", "m1", None, 2).unwrap();
    store.store_metric("h1", "m2", None, 1).unwrap();
    store.store_metric("h2", "m1", None, 1).unwrap();

    store.store_service("h2", "s1", 1).unwrap();
    store.store_service("h2", "s2", 2).unwrap();

    store.store_metric_attribute("h1", "m1", "k3", Value::Integer(42), 2).unwrap();

    store.store_service_attribute("h2", "s2", "k1", Value::Integer(123), 2).unwrap();
    store.store_service_attribute("h2", "s2", "k2", Value::Integer(4711), 1).unwrap();

    // Don't overwrite k1.
    assert_eq!(
        store.store_service_attribute("h2", "s2", "k1", Value::Integer(666), 2).unwrap(),
        UpdateStatus::Stale
    );

    store
}

fn tojson_full(store: &Store, kind: EntityKind, filter: Option<&Matcher>) -> String {
    let mut formatter = JsonFormatter::new();
    store
        .scan(kind, None, filter, &mut |item, filter| formatter.emit_full(&item, filter))
        .unwrap();
    formatter.finish()
}

fn tojson(store: &Store, kind: EntityKind) -> String {
    let mut formatter = JsonFormatter::new();
    store.scan(kind, None, None, &mut |item, _| formatter.emit(&item)).unwrap();
    formatter.finish()
}

fn last_update(op: CmpOp, ts: u64) -> Matcher {
    Matcher::field(Field::LastUpdate(ts), op)
}

#[test]
fn hosts_full_includes_all_children() {
    let store = populate();
    let expected = format!(
        "[\
         {{\"name\": \"h1\", {STAMP}, \
            \"attributes\": [\
              {{\"name\": \"k1\", \"value\": \"v1\", {STAMP}}},\
              {{\"name\": \"k2\", \"value\": \"v2\", {STAMP}}},\
              {{\"name\": \"k3\", \"value\": \"v3\", {STAMP}}}], \
            \"metrics\": [\
              {{\"name\": \"m1\", \"timeseries\": false, {STAMP}, \
                \"attributes\": [\
                  {{\"name\": \"k3\", \"value\": 42, {STAMP}}}]}},\
              {{\"name\": \"m2\", \"timeseries\": false, {STAMP}}}]}},\
         {{\"name\": \"h2\", {STAMP}, \
            \"metrics\": [\
              {{\"name\": \"m1\", \"timeseries\": false, {STAMP}}}], \
            \"services\": [\
              {{\"name\": \"s1\", {STAMP}}},\
              {{\"name\": \"s2\", {STAMP}, \
                \"attributes\": [\
                  {{\"name\": \"k1\", \"value\": 123, {STAMP}}},\
                  {{\"name\": \"k2\", \"value\": 4711, {STAMP}}}]}}]}}\
         ]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Host, None), expected);
}

#[test]
fn hosts_compact_has_no_sections() {
    let store = populate();
    let expected =
        format!("[{{\"name\": \"h1\", {STAMP}}},{{\"name\": \"h2\", {STAMP}}}]");
    assert_eq!(tojson(&store, EntityKind::Host), expected);
}

#[test]
fn name_filter_restricts_hosts_and_children() {
    let store = populate();
    let filter = Matcher::field(Field::Name("h1".into()), CmpOp::Eq);
    // The name filter also rejects every child, so no sections survive.
    let expected = format!("[{{\"name\": \"h1\", {STAMP}}}]");
    assert_eq!(tojson_full(&store, EntityKind::Host, Some(&filter)), expected);
}

#[test]
fn last_update_filter_restricts_whole_tree() {
    let store = populate();
    let filter = last_update(CmpOp::Gt, 1);
    let expected = format!(
        "[{{\"name\": \"h2\", {STAMP}, \
            \"services\": [\
              {{\"name\": \"s2\", {STAMP}, \
                \"attributes\": [\
                  {{\"name\": \"k1\", \"value\": 123, {STAMP}}}]}}]}}]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Host, Some(&filter)), expected);
}

#[test]
fn last_update_le_filter() {
    let store = populate();
    let filter = last_update(CmpOp::Le, 1);
    let expected = format!(
        "[{{\"name\": \"h1\", {STAMP}, \
            \"attributes\": [\
              {{\"name\": \"k1\", \"value\": \"v1\", {STAMP}}}], \
            \"metrics\": [\
              {{\"name\": \"m2\", \"timeseries\": false, {STAMP}}}]}}]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Host, Some(&filter)), expected);
}

#[test]
fn last_update_ge_filter_leaves_bare_host() {
    let store = populate();
    let filter = last_update(CmpOp::Ge, 3);
    let expected = format!("[{{\"name\": \"h2\", {STAMP}}}]");
    assert_eq!(tojson_full(&store, EntityKind::Host, Some(&filter)), expected);
}

#[test]
fn impossible_filter_yields_empty_array() {
    let store = populate();
    let filter = last_update(CmpOp::Lt, 0);
    for kind in [EntityKind::Host, EntityKind::Service, EntityKind::Metric] {
        assert_eq!(tojson_full(&store, kind, Some(&filter)), "[]");
    }
}

#[test]
fn services_full() {
    let store = populate();
    let expected = format!(
        "[{{\"name\": \"h2\", {STAMP}, \
            \"services\": [\
              {{\"name\": \"s1\", {STAMP}}},\
              {{\"name\": \"s2\", {STAMP}, \
                \"attributes\": [\
                  {{\"name\": \"k1\", \"value\": 123, {STAMP}}},\
                  {{\"name\": \"k2\", \"value\": 4711, {STAMP}}}]}}]}}]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Service, None), expected);
}

#[test]
fn services_compact_omits_attributes() {
    let store = populate();
    let expected = format!(
        "[{{\"name\": \"h2\", {STAMP}, \
            \"services\": [\
              {{\"name\": \"s1\", {STAMP}}},\
              {{\"name\": \"s2\", {STAMP}}}]}}]"
    );
    assert_eq!(tojson(&store, EntityKind::Service), expected);
}

#[test]
fn services_filtered() {
    let store = populate();
    let filter = last_update(CmpOp::Gt, 1);
    let expected = format!(
        "[{{\"name\": \"h2\", {STAMP}, \
            \"services\": [\
              {{\"name\": \"s2\", {STAMP}, \
                \"attributes\": [\
                  {{\"name\": \"k1\", \"value\": 123, {STAMP}}}]}}]}}]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Service, Some(&filter)), expected);
}

#[test]
fn metrics_full() {
    let store = populate();
    let expected = format!(
        "[\
         {{\"name\": \"h1\", {STAMP}, \
            \"metrics\": [\
              {{\"name\": \"m1\", \"timeseries\": false, {STAMP}, \
                \"attributes\": [\
                  {{\"name\": \"k3\", \"value\": 42, {STAMP}}}]}},\
              {{\"name\": \"m2\", \"timeseries\": false, {STAMP}}}]}},\
         {{\"name\": \"h2\", {STAMP}, \
            \"metrics\": [\
              {{\"name\": \"m1\", \"timeseries\": false, {STAMP}}}]}}\
         ]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Metric, None), expected);
}

#[test]
fn metrics_compact_omits_attributes() {
    let store = populate();
    let expected = format!(
        "[\
         {{\"name\": \"h1\", {STAMP}, \
            \"metrics\": [\
              {{\"name\": \"m1\", \"timeseries\": false, {STAMP}}},\
              {{\"name\": \"m2\", \"timeseries\": false, {STAMP}}}]}},\
         {{\"name\": \"h2\", {STAMP}, \
            \"metrics\": [\
              {{\"name\": \"m1\", \"timeseries\": false, {STAMP}}}]}}\
         ]"
    );
    assert_eq!(tojson(&store, EntityKind::Metric), expected);
}

#[test]
fn metrics_filtered_le() {
    let store = populate();
    let filter = last_update(CmpOp::Le, 1);
    let expected = format!(
        "[{{\"name\": \"h1\", {STAMP}, \
            \"metrics\": [\
              {{\"name\": \"m2\", \"timeseries\": false, {STAMP}}}]}}]"
    );
    assert_eq!(tojson_full(&store, EntityKind::Metric, Some(&filter)), expected);
}

#[test]
fn metric_with_store_ref_reports_timeseries() {
    let store = Store::new();
    store.store_host("h1", 1).unwrap();
    store
        .store_metric(
            "h1",
            "m1",
            Some(crate::store::entity::MetricStoreRef {
                fetcher: "rrdtool".into(),
                id: "/var/lib/m1.rrd".into(),
            }),
            1,
        )
        .unwrap();

    let out = tojson(&store, EntityKind::Metric);
    assert!(out.contains("\"timeseries\": true"), "{out}");
}

#[test]
fn strings_are_escaped() {
    let store = Store::new();
    store.store_host("h\"1\"", 1).unwrap();
    store.store_attribute("h\"1\"", "note", "line1\nline2".into(), 1).unwrap();

    let out = tojson_full(&store, EntityKind::Host, None);
    assert!(out.contains("\"name\": \"h\\\"1\\\"\""), "{out}");
    assert!(out.contains("\"value\": \"line1\\nline2\""), "{out}");

    // The document must stay valid JSON.
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed.is_array());
}
