//! Background receive loop
//!
//! Reads the server stream in chunks, frames it into lines, answers `PING`
//! with `PONG` and hands every line to the console, in stream order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::task::JoinHandle;

use crate::console::Console;
use crate::protocol::{Command, LineFramer};
use crate::transport::LineSender;
use crate::{CoreError, Result};

/// Bytes requested per read
pub const CHUNK_SIZE: usize = 1024;

/// Set-once flag telling the receiver to stop
///
/// Owned by the session, which sets it during shutdown. The receiver only
/// reads it.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run the receive loop until stopped or until the connection fails
///
/// The read is the only suspension point besides PONG sends. Once `stop` is
/// set, the end-of-stream (or error) produced by shutting the socket down for
/// reads ends the loop with `Ok`.
///
/// # Errors
/// - `ConnectionClosed` when the server closes the stream while running
/// - `ReceiveFailed` when a read errors while running
/// - any `LineSender::send` error from a PONG reply sent while running
pub async fn receive<R, W>(
    mut reader: R,
    sender: LineSender<W>,
    stop: StopSignal,
    console: Arc<dyn Console>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    while !stop.is_set() {
        console.verbose("Checking for data sent over the socket...");

        let n = match reader.read(&mut buf).await {
            Ok(0) if stop.is_set() => break,
            Ok(0) => return Err(CoreError::ConnectionClosed),
            Ok(n) => n,
            Err(e) if stop.is_set() => {
                tracing::debug!("Read after shutdown returned: {}", e);
                break;
            }
            Err(e) => return Err(CoreError::ReceiveFailed(e)),
        };

        let chunk = &buf[..n];
        console.verbose(&format!("Received: {}", String::from_utf8_lossy(chunk)));

        for line in framer.push(chunk) {
            // Unanswered PINGs get us disconnected
            if let Some(pong) = Command::pong_for(&line) {
                console.verbose(&format!("Sending: {}", pong));
                match sender.send_command(&pong).await {
                    Ok(()) => {}
                    // Writes were shut down under us during teardown
                    Err(e) if stop.is_set() => {
                        tracing::debug!("PONG after shutdown failed: {}", e);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            console.echo(&line);
        }
    }

    console.verbose("Done receiving data over the socket.");
    Ok(())
}

/// Spawn [`receive`] as a background task
pub fn spawn<R, W>(
    reader: R,
    sender: LineSender<W>,
    stop: StopSignal,
    console: Arc<dyn Console>,
) -> JoinHandle<Result<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = receive(reader, sender, stop, console).await;
        match &result {
            Ok(()) => tracing::debug!("Receiver stopped"),
            Err(e) => tracing::debug!("Receiver failed: {}", e),
        }
        result
    })
}
