// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-series data returned by fetcher plugins.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A datum at a certain point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: Timestamp,
    pub value: f64,
}

/// One or more sequences of data points sharing the same start and end
/// times. The actual bounds may diverge slightly from the requested ones,
/// depending on the resolution of the backing data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Named sequences; every sequence has the same length.
    pub series: Vec<(String, Vec<DataPoint>)>,
}

impl TimeSeries {
    /// Pre-populate the named sequences, each with `len` zeroed data points.
    pub fn new(start: Timestamp, end: Timestamp, names: &[&str], len: usize) -> Self {
        let series = names
            .iter()
            .map(|name| {
                (name.to_string(), vec![DataPoint { timestamp: 0, value: 0.0 }; len])
            })
            .collect();
        TimeSeries { start, end, series }
    }
}

/// Generic bounds for a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesOpts {
    pub start: Timestamp,
    pub end: Timestamp,
}
