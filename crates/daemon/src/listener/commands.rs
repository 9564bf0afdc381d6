// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers.

use tracing::warn;

use sysinv_core::{EntityKind, JsonFormatter};
use sysinv_wire::{Code, DataKind, Frame};

use super::ListenCtx;

/// Turn one command into its reply frame.
pub(crate) fn dispatch(code: u32, payload: &[u8], ctx: &ListenCtx) -> Frame {
    match Code::from_u32(code) {
        Some(Code::Ping) => Frame::empty(Code::Ok),
        Some(Code::Startup) => handle_startup(payload),
        Some(Code::List) => handle_list(ctx),
        _ => {
            warn!("Ignoring invalid command");
            Frame::error(&format!("Invalid command {code:#x}"))
        }
    }
}

/// Session setup. Nothing to negotiate yet; the payload (a client name)
/// is accepted as-is.
fn handle_startup(_payload: &[u8]) -> Frame {
    Frame::empty(Code::Ok)
}

/// Serialize every host with its children.
fn handle_list(ctx: &ListenCtx) -> Frame {
    let mut formatter = JsonFormatter::new();
    let result = ctx.store.scan(EntityKind::Host, None, None, &mut |item, filter| {
        formatter.emit_full(&item, filter)
    });
    match result {
        Ok(()) => Frame::data(DataKind::Host, formatter.finish().as_bytes()),
        Err(e) => Frame::error(&format!("Failed to list hosts: {e}")),
    }
}
