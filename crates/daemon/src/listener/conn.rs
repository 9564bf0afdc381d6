// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection command framing.
//!
//! A connection owns a read buffer and the current-command state
//! `{code, declared length}`, initially idle. Commands are dispatched as
//! soon as their full payload is buffered; a read may complete any number
//! of commands, including zero.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info};

use sysinv_wire::{write_frame, Code, HEADER_LEN};

use super::{commands, ConnectionError, ListenCtx};

const READ_CHUNK: usize = 1024;

/// Current-command state: idle, or an accepted header waiting for its
/// payload.
struct CommandState {
    code: u32,
    declared_len: usize,
}

impl CommandState {
    fn idle() -> Self {
        CommandState { code: Code::Idle as u32, declared_len: 0 }
    }

    fn is_idle(&self) -> bool {
        self.code == Code::Idle as u32 && self.declared_len == 0
    }
}

pub(crate) struct Connection {
    buf: BytesMut,
    state: CommandState,
}

impl Connection {
    pub fn new() -> Self {
        Connection { buf: BytesMut::with_capacity(READ_CHUNK), state: CommandState::idle() }
    }

    /// Consume the next complete command from the buffer, if any.
    ///
    /// Keepalives (an IDLE code) are consumed and discarded here; callers
    /// only ever see real commands.
    fn next_command(&mut self) -> Option<(u32, Vec<u8>)> {
        loop {
            if self.state.is_idle() {
                if self.buf.len() < HEADER_LEN {
                    return None;
                }
                let code = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
                let len =
                    u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]);
                self.buf.advance(HEADER_LEN);
                self.state = CommandState { code, declared_len: len as usize };
            }

            if self.buf.len() < self.state.declared_len {
                return None;
            }

            let payload = self.buf.split_to(self.state.declared_len).to_vec();
            let code = self.state.code;
            self.state = CommandState::idle();

            if code == Code::Idle as u32 {
                // Keepalive; discard the payload.
                continue;
            }
            return Some((code, payload));
        }
    }

    fn buffered(&self) -> usize {
        self.buf.len()
    }
}

/// Drive one client connection: read, frame, dispatch, reply.
///
/// A handler failure produces an ERROR reply and the connection survives;
/// only EOF or a socket error ends the task.
pub(crate) async fn handle_connection<S>(stream: S, ctx: &ListenCtx) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut conn = Connection::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            let left = conn.buffered();
            if left > 0 {
                info!(
                    "Discarding incomplete command ({} byte{} left in buffer)",
                    left,
                    if left == 1 { "" } else { "s" }
                );
            }
            return Ok(());
        }
        conn.buf.extend_from_slice(&chunk[..n]);

        while let Some((code, payload)) = conn.next_command() {
            debug!("Handling command {} (len: {})", code, payload.len());
            let reply = commands::dispatch(code, &payload, ctx);
            write_frame(&mut writer, &reply).await?;
        }
    }
}
