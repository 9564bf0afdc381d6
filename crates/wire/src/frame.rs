// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame codec: 4-byte big-endian code, 4-byte big-endian payload length,
//! then the payload. An empty payload is legal.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the code + length header.
pub const HEADER_LEN: usize = 8;

/// Well-known frame codes. Requests below 100, replies from 100 up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Code {
    /// Keepalive; the server discards the payload.
    Idle = 0,
    Ping = 1,
    Startup = 2,
    List = 3,

    Ok = 100,
    Error = 101,
    Log = 102,
    Data = 103,
}

impl Code {
    pub fn from_u32(code: u32) -> Option<Code> {
        match code {
            0 => Some(Code::Idle),
            1 => Some(Code::Ping),
            2 => Some(Code::Startup),
            3 => Some(Code::List),
            100 => Some(Code::Ok),
            101 => Some(Code::Error),
            102 => Some(Code::Log),
            103 => Some(Code::Data),
            _ => None,
        }
    }
}

/// Subtype carried in the first four bytes of a DATA reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataKind {
    Host = 1,
    Service = 2,
    Metric = 3,
}

impl DataKind {
    pub fn from_u32(kind: u32) -> Option<DataKind> {
        match kind {
            1 => Some(DataKind::Host),
            2 => Some(DataKind::Service),
            3 => Some(DataKind::Metric),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("truncated frame: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("server error: {0}")]
    ErrorReply(String),

    #[error("unexpected reply code {0:#x}")]
    UnexpectedReply(u32),
}

/// One protocol frame. The code is kept raw so unknown codes survive the
/// trip to the dispatcher, which answers them with an ERROR reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub code: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(code: Code, payload: impl Into<Vec<u8>>) -> Frame {
        Frame { code: code as u32, payload: payload.into() }
    }

    pub fn empty(code: Code) -> Frame {
        Frame { code: code as u32, payload: Vec::new() }
    }

    /// A DATA reply: 4-byte big-endian subtype followed by the body.
    pub fn data(kind: DataKind, body: &[u8]) -> Frame {
        let mut payload = Vec::with_capacity(4 + body.len());
        payload.extend_from_slice(&(kind as u32).to_be_bytes());
        payload.extend_from_slice(body);
        Frame { code: Code::Data as u32, payload }
    }

    /// An ERROR reply; the message is NUL-terminated on the wire.
    pub fn error(message: &str) -> Frame {
        let mut payload = Vec::with_capacity(message.len() + 1);
        payload.extend_from_slice(message.as_bytes());
        payload.push(0);
        Frame { code: Code::Error as u32, payload }
    }

    pub fn code(&self) -> Option<Code> {
        Code::from_u32(self.code)
    }

    /// Split a DATA payload into its subtype and body.
    pub fn data_kind(&self) -> Option<(DataKind, &[u8])> {
        if self.code != Code::Data as u32 || self.payload.len() < 4 {
            return None;
        }
        let kind = u32::from_be_bytes([
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.payload[3],
        ]);
        DataKind::from_u32(kind).map(|k| (k, &self.payload[4..]))
    }
}

/// Serialize a frame.
pub fn encode(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + frame.payload.len());
    out.extend_from_slice(&frame.code.to_be_bytes());
    out.extend_from_slice(&(frame.payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&frame.payload);
    out
}

/// Deserialize exactly one frame from `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Frame, ProtocolError> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated { expected: HEADER_LEN, got: bytes.len() });
    }
    let code = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if bytes.len() != HEADER_LEN + len {
        return Err(ProtocolError::Truncated { expected: HEADER_LEN + len, got: bytes.len() });
    }
    Ok(Frame { code, payload: bytes[HEADER_LEN..].to_vec() })
}

/// Read one frame; a clean EOF before the header maps to
/// [`ProtocolError::ConnectionClosed`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
        _ => ProtocolError::Io(e),
    })?;

    let code = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
        _ => ProtocolError::Io(e),
    })?;

    Ok(Frame { code, payload })
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode(frame)).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
