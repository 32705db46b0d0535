//! TCP transport for a single IRC server connection
//!
//! A [`Connection`] is split three ways once it is open:
//! - the read half, moved into the receiver task
//! - a [`LineSender`] around the write half, shared by every task that sends
//! - a duplicated control handle, used only to shut the socket down

pub mod receiver;
pub mod sender;

pub use receiver::StopSignal;
pub use sender::LineSender;

use std::io::ErrorKind;
use std::net::Shutdown;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::config::ServerAddress;
use crate::{CoreError, Result};

/// An open connection to the IRC server
///
/// Owned by the session for its whole lifetime. [`Connection::close`]
/// consumes it, so a closed connection cannot be used again.
#[derive(Debug)]
pub struct Connection {
    reader: Option<OwnedReadHalf>,
    sender: LineSender<OwnedWriteHalf>,
    control: std::net::TcpStream,
}

impl Connection {
    /// Resolve and connect. No retries.
    pub async fn connect(server: &ServerAddress) -> Result<Self> {
        let connect_error = |source| CoreError::Connect {
            addr: server.to_string(),
            source,
        };

        let stream = TcpStream::connect((server.host.as_str(), server.port))
            .await
            .map_err(connect_error)?;

        Self::from_stream(stream).map_err(connect_error)
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> std::io::Result<Self> {
        // The control handle is a dup of the same socket: shutting it down
        // wakes a read pending on the tokio half owned by another task.
        let stream = stream.into_std()?;
        let control = stream.try_clone()?;
        let stream = TcpStream::from_std(stream)?;

        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader: Some(reader),
            sender: LineSender::new(writer),
            control,
        })
    }

    /// Hand the read half to the receiver. Only the first call gets it.
    pub fn take_reader(&mut self) -> Option<OwnedReadHalf> {
        self.reader.take()
    }

    /// Shared, serialized sender for outbound lines
    pub fn sender(&self) -> LineSender<OwnedWriteHalf> {
        self.sender.clone()
    }

    /// Stop further reads
    ///
    /// A read blocked in the receiver returns end-of-stream. This is the
    /// only way to cancel that read.
    pub fn shutdown_read(&self) -> Result<()> {
        self.control.shutdown(Shutdown::Read).map_err(CoreError::Io)
    }

    /// Stop further reads and writes
    ///
    /// Wakes a blocked read like [`Connection::shutdown_read`] and also makes
    /// a write waiting on a full send buffer fail.
    pub fn shutdown_both(&self) -> Result<()> {
        self.control.shutdown(Shutdown::Both).map_err(CoreError::Io)
    }

    /// Best-effort shutdown of both directions, then release the socket
    pub async fn close(self) {
        if let Err(e) = self.sender.close().await {
            tracing::debug!("Write half shutdown failed: {}", e);
        }

        match self.control.shutdown(Shutdown::Both) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => tracing::warn!("Socket shutdown failed: {}", e),
        }

        tracing::debug!("Connection closed");
    }
}
