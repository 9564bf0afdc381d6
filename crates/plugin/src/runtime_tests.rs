// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use sysinv_core::{DataPoint, Store};

fn test_ctx(name: &str) -> Arc<PluginContext> {
    PluginContext::new(
        name,
        PathBuf::from(format!("/plugins/{name}.so")),
        None,
        PluginConfig::default(),
    )
}

/// Writer that records which operations ran and returns a fixed outcome.
struct RecordingWriter {
    calls: Mutex<Vec<String>>,
    result: Result<UpdateStatus, StoreError>,
}

impl RecordingWriter {
    fn new(result: Result<UpdateStatus, StoreError>) -> Arc<Self> {
        Arc::new(RecordingWriter { calls: Mutex::new(Vec::new()), result })
    }

    fn record(&self, what: String) -> Result<UpdateStatus, StoreError> {
        self.calls.lock().push(what);
        self.result.clone()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl StoreWriter for RecordingWriter {
    fn store_host(&self, name: &str, ts: Timestamp) -> Result<UpdateStatus, StoreError> {
        self.record(format!("host:{name}@{ts}"))
    }

    fn store_service(
        &self,
        host: &str,
        name: &str,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        self.record(format!("service:{host}/{name}@{ts}"))
    }

    fn store_metric(
        &self,
        host: &str,
        name: &str,
        _store_ref: Option<MetricStoreRef>,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        self.record(format!("metric:{host}/{name}@{ts}"))
    }

    fn store_attribute(
        &self,
        host: &str,
        key: &str,
        _value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        self.record(format!("attr:{host}/{key}@{ts}"))
    }

    fn store_service_attribute(
        &self,
        host: &str,
        service: &str,
        key: &str,
        _value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        self.record(format!("svcattr:{host}/{service}/{key}@{ts}"))
    }

    fn store_metric_attribute(
        &self,
        host: &str,
        metric: &str,
        key: &str,
        _value: Value,
        ts: Timestamp,
    ) -> Result<UpdateStatus, StoreError> {
        self.record(format!("metricattr:{host}/{metric}/{key}@{ts}"))
    }
}

#[test]
fn core_registrations_get_the_core_prefix() {
    let runtime = PluginRuntime::new();
    runtime.register_init(None, "main", Arc::new(|_| Ok(()))).unwrap();
    assert!(runtime.init.lock().find("core::main").is_some());
}

#[test]
fn plugin_registrations_get_the_plugin_prefix() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("load");
    runtime.register_init(Some(&ctx), "main", Arc::new(|_| Ok(()))).unwrap();
    assert!(runtime.init.lock().find("load::main").is_some());
}

#[test]
fn config_registration_requires_a_plugin_scope() {
    let runtime = PluginRuntime::new();
    let err = runtime.register_config(None, Arc::new(|_, _| Ok(()))).unwrap_err();
    assert!(matches!(err, PluginError::NoContext("config")));
}

#[test]
fn configure_dispatches_to_the_plugin() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("load");
    runtime.add_plugin(Arc::clone(&ctx));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);
    runtime
        .register_config(
            Some(&ctx),
            Arc::new(move |ctx, item| {
                seen_in_cb.lock().push((ctx.name().to_string(), item.map(|i| i.key.clone())));
                Ok(())
            }),
        )
        .unwrap();

    runtime.configure("load", &ConfigItem::new("Interval")).unwrap();
    assert_eq!(*seen.lock(), [("load".to_string(), Some("Interval".to_string()))]);
}

#[test]
fn configure_unknown_plugin_is_not_found() {
    let runtime = PluginRuntime::new();
    assert!(matches!(
        runtime.configure("ghost", &ConfigItem::new("x")),
        Err(PluginError::NotFound(_))
    ));
}

#[test]
fn duplicate_registration_is_rejected_until_unregistered() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("mod");
    runtime.add_plugin(Arc::clone(&ctx));
    runtime.register_log(Some(&ctx), "out", Arc::new(|_, _| {})).unwrap();
    assert!(runtime.register_log(Some(&ctx), "out", Arc::new(|_, _| {})).is_err());

    runtime.unregister_plugin("mod");
    runtime.register_log(Some(&ctx), "out", Arc::new(|_, _| {})).unwrap();
}

#[test]
fn write_fan_out_reaches_every_writer() {
    let runtime = PluginRuntime::new();
    let a = RecordingWriter::new(Ok(UpdateStatus::Updated));
    let b = RecordingWriter::new(Ok(UpdateStatus::Updated));
    runtime.register_writer(None, "a", Arc::clone(&a) as Arc<dyn StoreWriter>).unwrap();
    runtime.register_writer(None, "b", Arc::clone(&b) as Arc<dyn StoreWriter>).unwrap();

    assert_eq!(runtime.store_host("h1", 1), Ok(UpdateStatus::Updated));
    assert_eq!(runtime.store_service("h1", "s1", 2), Ok(UpdateStatus::Updated));
    assert_eq!(a.calls(), ["host:h1@1", "service:h1/s1@2"]);
    assert_eq!(b.calls(), ["host:h1@1", "service:h1/s1@2"]);
}

#[test]
fn aggregate_is_success_when_any_writer_accepted_the_update() {
    let runtime = PluginRuntime::new();
    let fresh = RecordingWriter::new(Ok(UpdateStatus::Updated));
    let stale = RecordingWriter::new(Ok(UpdateStatus::Stale));
    runtime.register_writer(None, "fresh", fresh as Arc<dyn StoreWriter>).unwrap();
    runtime.register_writer(None, "stale", stale as Arc<dyn StoreWriter>).unwrap();

    assert_eq!(runtime.store_host("h1", 1), Ok(UpdateStatus::Updated));
}

#[test]
fn aggregate_is_stale_only_when_every_writer_reports_stale() {
    let runtime = PluginRuntime::new();
    let a = RecordingWriter::new(Ok(UpdateStatus::Stale));
    let b = RecordingWriter::new(Ok(UpdateStatus::Stale));
    runtime.register_writer(None, "a", a as Arc<dyn StoreWriter>).unwrap();
    runtime.register_writer(None, "b", b as Arc<dyn StoreWriter>).unwrap();

    assert_eq!(runtime.store_host("h1", 1), Ok(UpdateStatus::Stale));
}

#[test]
fn aggregate_error_does_not_stop_the_fan_out() {
    let runtime = PluginRuntime::new();
    let failing = RecordingWriter::new(Err(StoreError::InvalidArgument("boom")));
    let ok = RecordingWriter::new(Ok(UpdateStatus::Updated));
    runtime.register_writer(None, "failing", Arc::clone(&failing) as Arc<dyn StoreWriter>).unwrap();
    runtime.register_writer(None, "ok", Arc::clone(&ok) as Arc<dyn StoreWriter>).unwrap();

    assert!(runtime.store_host("h1", 1).is_err());
    // The second writer still saw the write.
    assert_eq!(ok.calls(), ["host:h1@1"]);
}

#[test]
fn the_memory_store_is_just_another_writer() {
    let runtime = PluginRuntime::new();
    let store = Arc::new(Store::new());
    runtime.register_writer(None, "memory", Arc::clone(&store) as Arc<dyn StoreWriter>).unwrap();

    runtime.store_host("h1", 1).unwrap();
    runtime.store_attribute("h1", "arch", "riscv".into(), 1).unwrap();
    assert_eq!(store.with_host("h1", |h| h.attribute("arch").map(|a| a.value.clone())), Some(Some("riscv".into())));
}

#[test]
fn cname_chain_rewrites_host_names_on_store() {
    let runtime = PluginRuntime::new();
    let store = Arc::new(Store::new());
    runtime.register_writer(None, "memory", Arc::clone(&store) as Arc<dyn StoreWriter>).unwrap();
    runtime
        .register_cname(None, "canon", Arc::new(|name: &str| Some(name.to_lowercase())))
        .unwrap();
    // A rewriter that declines leaves the name alone.
    runtime.register_cname(None, "noop", Arc::new(|_: &str| None)).unwrap();

    runtime.store_host("WEB-1.example.COM", 1).unwrap();
    assert_eq!(store.with_host("web-1.example.com", |h| h.name.clone()), Some("web-1.example.com".into()));
}

#[test]
fn log_fan_out_reaches_registered_callbacks() {
    let runtime = PluginRuntime::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = Arc::clone(&seen);
    runtime
        .register_log(
            None,
            "capture",
            Arc::new(move |priority, message: &str| {
                seen_in_cb.lock().push((priority, message.to_string()));
            }),
        )
        .unwrap();

    runtime.log(Priority::Warning, "disk almost full");
    assert_eq!(*seen.lock(), [(Priority::Warning, "disk almost full".to_string())]);
}

#[test]
fn fetch_dispatches_by_fetcher_type() {
    let runtime = PluginRuntime::new();
    runtime
        .register_fetcher(
            None,
            "rrdtool",
            Arc::new(|id: &str, opts: &TimeSeriesOpts| {
                let mut ts = TimeSeries::new(opts.start, opts.end, &[id], 1);
                ts.series[0].1[0] = DataPoint { timestamp: opts.start, value: 1.0 };
                Ok(ts)
            }),
        )
        .unwrap();

    let opts = TimeSeriesOpts { start: 10, end: 20 };
    let ts = runtime.fetch_timeseries("rrdtool", "/var/lib/m1.rrd", &opts).unwrap();
    assert_eq!(ts.series[0].0, "/var/lib/m1.rrd");

    assert!(matches!(
        runtime.fetch_timeseries("whisper", "id", &opts),
        Err(PluginError::NotFound(_))
    ));
}

#[test]
fn fetchers_register_under_their_raw_name() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("rrd-plugin");
    runtime
        .register_fetcher(Some(&ctx), "rrdtool", Arc::new(|_: &str, _: &TimeSeriesOpts| {
            Err(PluginError::Callback("unavailable".into()))
        }))
        .unwrap();
    assert!(runtime.fetchers.lock().find("rrdtool").is_some());
    assert!(runtime.fetchers.lock().find("rrd-plugin::rrdtool").is_none());
}

#[test]
fn init_failure_unregisters_the_whole_plugin() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("flaky");
    runtime.add_plugin(Arc::clone(&ctx));
    runtime
        .register_init(Some(&ctx), "main", Arc::new(|_| Err(PluginError::Callback("nope".into()))))
        .unwrap();
    runtime.register_log(Some(&ctx), "out", Arc::new(|_, _| {})).unwrap();

    assert_eq!(runtime.init_all(), 1);
    assert!(runtime.plugin("flaky").is_none());
    assert_eq!(runtime.log.lock().len(), 0);
    assert_eq!(runtime.init.lock().len(), 0);
}

#[test]
fn reconfigure_drops_plugins_that_do_not_re_register() {
    let runtime = PluginRuntime::new();
    let kept = test_ctx("kept");
    let dropped = test_ctx("dropped");
    runtime.add_plugin(Arc::clone(&kept));
    runtime.add_plugin(Arc::clone(&dropped));

    let deconfigured = Arc::new(AtomicUsize::new(0));
    for ctx in [&kept, &dropped] {
        let deconfigured = Arc::clone(&deconfigured);
        runtime
            .register_config(
                Some(ctx),
                Arc::new(move |_, item| {
                    if item.is_none() {
                        deconfigured.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(())
                }),
            )
            .unwrap();
    }

    runtime.reconfigure_init();
    assert_eq!(deconfigured.load(Ordering::Relaxed), 2);
    assert_eq!(runtime.config.lock().len(), 0);
    assert_eq!(kept.use_count(), 0);

    // The surviving plugin re-registers during reload.
    kept.raise_use();
    runtime.register_config(Some(&kept), Arc::new(|_, _| Ok(()))).unwrap();

    runtime.reconfigure_finish();
    assert!(runtime.plugin("kept").is_some());
    assert!(runtime.plugin("dropped").is_none());
}

#[test]
fn collector_interval_falls_back_to_the_plugin_config() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("load");
    ctx.set_config(PluginConfig { interval: 5_000, timeout: 0 });

    runtime.register_collector(Some(&ctx), "read", None, Box::new(|_| Ok(()))).unwrap();
    let entry = runtime.shift_collector().unwrap();
    assert_eq!(entry.interval, 5_000);
}

#[test]
fn collector_without_scope_needs_an_explicit_interval() {
    let runtime = PluginRuntime::new();
    let err = runtime.register_collector(None, "read", None, Box::new(|_| Ok(()))).unwrap_err();
    assert!(matches!(err, PluginError::NoContext(_)));

    runtime.register_collector(None, "read", Some(1_000), Box::new(|_| Ok(()))).unwrap();
    assert_eq!(runtime.collector_count(), 1);
}

#[test]
fn duplicate_collectors_are_rejected() {
    let runtime = PluginRuntime::new();
    runtime.register_collector(None, "read", Some(1_000), Box::new(|_| Ok(()))).unwrap();
    let err =
        runtime.register_collector(None, "read", Some(1_000), Box::new(|_| Ok(()))).unwrap_err();
    assert!(matches!(err, PluginError::Duplicate { kind: "collector", .. }));
}

#[test]
fn callbacks_receive_their_own_context() {
    let runtime = PluginRuntime::new();
    let ctx = test_ctx("who");
    let seen = Arc::new(Mutex::new(None));
    let seen_in_cb = Arc::clone(&seen);
    runtime
        .register_init(
            Some(&ctx),
            "main",
            Arc::new(move |scope| {
                *seen_in_cb.lock() = scope.map(|c| c.name().to_string());
                Ok(())
            }),
        )
        .unwrap();

    runtime.init_all();
    assert_eq!(*seen.lock(), Some("who".to_string()));
}
