// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store operation outcomes.
//!
//! A write that is rejected because the incoming timestamp is not newer than
//! the stored one is *stale*: a positive outcome, not an error.

use thiserror::Error;

use crate::store::entity::EntityKind;

/// Successful outcome of a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The entity was created or its payload updated.
    Updated,
    /// The incoming timestamp was not newer than the stored one; the
    /// existing payload is preserved.
    Stale,
}

/// Errors from store writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("invalid {0}")]
    InvalidArgument(&'static str),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        StoreError::NotFound { kind, name: name.into() }
    }
}
