// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed attribute values.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::time::{format_datetime, Timestamp};

/// A typed value attached to an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    String(String),
    DateTime(Timestamp),
    Binary(Vec<u8>),
}

impl Value {
    /// Render the value to its unquoted string form, as used when matching
    /// attribute values by name predicate.
    pub fn unquoted(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::String(s) => s.clone(),
            Value::DateTime(ts) => format_datetime(*ts),
            Value::Binary(bytes) => {
                let mut out = String::with_capacity(2 * bytes.len());
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
                out
            }
        }
    }

    /// Append the value in its JSON form to `buf`. Numbers stay bare, all
    /// other variants become JSON strings.
    pub(crate) fn write_json(&self, buf: &mut String) {
        match self {
            Value::Integer(n) => {
                let _ = write!(buf, "{n}");
            }
            Value::Decimal(d) => {
                let _ = write!(buf, "{d}");
            }
            _ => crate::store::json::write_escaped(buf, &self.unquoted()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unquoted())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
