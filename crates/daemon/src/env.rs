// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use sysinv_core::time::NS_PER_SEC;
use sysinv_core::Interval;

/// Resolve state directory: SYSINV_STATE_DIR > XDG_STATE_HOME/sysinv >
/// ~/.local/state/sysinv
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SYSINV_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("sysinv"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/sysinv"))
}

/// Listening socket path. `SYSINV_SOCKET` overrides the state-dir default.
pub fn socket_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SYSINV_SOCKET") {
        return Some(PathBuf::from(path));
    }
    state_dir().map(|dir| dir.join("sysinv.sock"))
}

/// Plugin base directory (`SYSINV_PLUGIN_DIR`).
pub fn plugin_dir() -> PathBuf {
    std::env::var("SYSINV_PLUGIN_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/usr/local/lib/sysinv"))
}

/// Plugins to load at startup (`SYSINV_PLUGINS`, comma-separated).
pub fn plugins() -> Vec<String> {
    std::env::var("SYSINV_PLUGINS")
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

/// Default collector interval (`SYSINV_INTERVAL_SECS`, default 15s).
pub fn default_interval() -> Interval {
    std::env::var("SYSINV_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(|secs| secs * NS_PER_SEC)
        .unwrap_or(15 * NS_PER_SEC)
}
