// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the daemon socket.

use std::path::Path;

use tokio::net::UnixStream;

use crate::frame::{read_frame, write_frame, Code, Frame, ProtocolError};

/// A connection to the daemon socket.
pub struct Client {
    stream: UnixStream,
}

impl Client {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Client, ProtocolError> {
        let stream = UnixStream::connect(path).await?;
        Ok(Client { stream })
    }

    /// Send a frame without waiting for a reply.
    pub async fn send(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        write_frame(&mut self.stream, frame).await
    }

    /// Read the next reply frame.
    pub async fn read(&mut self) -> Result<Frame, ProtocolError> {
        read_frame(&mut self.stream).await
    }

    /// Send a request and wait for its reply. An ERROR reply becomes
    /// [`ProtocolError::ErrorReply`] with the NUL terminator stripped.
    pub async fn request(&mut self, frame: &Frame) -> Result<Frame, ProtocolError> {
        self.send(frame).await?;
        let reply = self.read().await?;
        if reply.code() == Some(Code::Error) {
            let msg = reply.payload.strip_suffix(&[0]).unwrap_or(&reply.payload);
            return Err(ProtocolError::ErrorReply(String::from_utf8_lossy(msg).into_owned()));
        }
        Ok(reply)
    }

    /// Health check: PING must come back as an empty OK.
    pub async fn ping(&mut self) -> Result<(), ProtocolError> {
        let reply = self.request(&Frame::empty(Code::Ping)).await?;
        match reply.code() {
            Some(Code::Ok) => Ok(()),
            _ => Err(ProtocolError::UnexpectedReply(reply.code)),
        }
    }

    /// List the inventory; returns the JSON document of the DATA reply.
    pub async fn list(&mut self) -> Result<String, ProtocolError> {
        let reply = self.request(&Frame::empty(Code::List)).await?;
        match reply.data_kind() {
            Some((_, body)) => Ok(String::from_utf8_lossy(body).into_owned()),
            None => Err(ProtocolError::UnexpectedReply(reply.code)),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
