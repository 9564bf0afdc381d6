// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin metadata, the public per-plugin config block, and the parsed
//! configuration tree handed to config callbacks.

use serde::{Deserialize, Serialize};
use sysinv_core::Interval;

/// Mutable plugin metadata, filled in by the module's init function.
///
/// Unset string fields render as `"<field> not set"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginInfo {
    description: Option<String>,
    copyright: Option<String>,
    license: Option<String>,
    version: Option<i32>,
    plugin_version: Option<i32>,
}

impl PluginInfo {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("description not set")
    }

    pub fn copyright(&self) -> &str {
        self.copyright.as_deref().unwrap_or("copyright not set")
    }

    pub fn license(&self) -> &str {
        self.license.as_deref().unwrap_or("license not set")
    }

    /// Daemon protocol version the plugin was built against.
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn plugin_version(&self) -> Option<i32> {
        self.plugin_version
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    pub fn set_copyright(&mut self, copyright: &str) {
        self.copyright = Some(copyright.to_string());
    }

    pub fn set_license(&mut self, license: &str) {
        self.license = Some(license.to_string());
    }

    pub fn set_version(&mut self, version: i32) {
        self.version = Some(version);
    }

    pub fn set_plugin_version(&mut self, version: i32) {
        self.plugin_version = Some(version);
    }
}

/// Public per-plugin configuration block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Polling interval for the plugin's collectors, in nanoseconds.
    /// Zero means "use the loop default".
    #[serde(default)]
    pub interval: Interval,
    /// Timeout for the plugin's own I/O, in nanoseconds. Advisory; the
    /// runtime does not enforce it.
    #[serde(default)]
    pub timeout: Interval,
}

/// One item of parsed configuration: a key, its values, and nested items.
///
/// The configuration file parser lives outside this crate; config
/// callbacks receive the parsed tree and `None` to signal "deconfigure".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub children: Vec<ConfigItem>,
}

impl ConfigItem {
    pub fn new(key: &str) -> Self {
        ConfigItem { key: key.to_string(), ..Default::default() }
    }

    /// First value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// First child with the given key (case-insensitive).
    pub fn child(&self, key: &str) -> Option<&ConfigItem> {
        self.children.iter().find(|c| c.key.eq_ignore_ascii_case(key))
    }
}

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;
