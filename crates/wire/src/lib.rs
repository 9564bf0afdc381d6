// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for daemon communication.
//!
//! Frame format: 4-byte big-endian code + 4-byte big-endian payload
//! length + payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod frame;

pub use client::Client;
pub use frame::{
    decode, encode, read_frame, write_frame, Code, DataKind, Frame, ProtocolError, HEADER_LEN,
};
