// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sysinv-core: store, matcher tree, and shared types for the sysinv daemon.

pub mod status;
pub mod store;
pub mod time;
pub mod timeseries;
pub mod value;

pub use status::{StoreError, UpdateStatus};
pub use store::entity::{Attribute, EntityKind, Host, Metric, MetricStoreRef, ObjRef, Service};
pub use store::json::JsonFormatter;
pub use store::matcher::{
    AttrMatcher, CmpOp, Field, FieldMatcher, HostMatcher, MatchError, Matcher, NamePattern,
    ServiceMatcher,
};
pub use store::{ScanItem, Store, StoreWriter};
pub use time::{Interval, Timestamp};
pub use timeseries::{DataPoint, TimeSeries, TimeSeriesOpts};
pub use value::Value;
