// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin runtime errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin {0:?} not found")]
    NotFound(String),

    #[error("{kind} callback {name:?} already registered")]
    Duplicate { kind: &'static str, name: String },

    #[error("invalid {0}")]
    InvalidArgument(&'static str),

    #[error("no plugin context for {0}")]
    NoContext(&'static str),

    #[error("module file {0:?} is not accessible")]
    ModuleMissing(PathBuf),

    #[error("failed to load module {name:?}: {source}")]
    ModuleLoad {
        name: String,
        #[source]
        source: libloading::Error,
    },

    #[error("module {name:?} init failed with status {status}")]
    ModuleInit { name: String, status: i32 },

    #[error("no collectors registered")]
    NoCollectors,

    #[error("callback failed: {0}")]
    Callback(String),

    #[error("internal error: {0}")]
    Internal(&'static str),
}
