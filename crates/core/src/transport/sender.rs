//! Serialized writes to the server

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::protocol::Command;
use crate::{CoreError, Result};

/// Write side of a connection, shared between tasks
///
/// The foreground sends user commands and the receiver sends PONG replies.
/// The lock is held for the whole write loop, so two lines never interleave
/// even when the socket accepts them a few bytes at a time.
#[derive(Debug)]
pub struct LineSender<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> Clone for LineSender<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W> LineSender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write every byte of `data`
    ///
    /// # Errors
    /// - `SendFailed` if a write call errors
    /// - `ConnectionBroken` if a write call accepts nothing while bytes remain
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;

        let mut sent = 0;
        while sent < data.len() {
            let n = writer
                .write(&data[sent..])
                .await
                .map_err(CoreError::SendFailed)?;
            if n == 0 {
                tracing::debug!("Write accepted 0 of {} remaining bytes", data.len() - sent);
                return Err(CoreError::ConnectionBroken);
            }
            sent += n;
            tracing::trace!("Sent {}/{} bytes", sent, data.len());
        }

        writer.flush().await.map_err(CoreError::SendFailed)
    }

    /// Send one command line
    pub async fn send_command(&self, command: &Command) -> Result<()> {
        self.send(command.to_wire().as_bytes()).await
    }

    /// Shut the write side down
    pub async fn close(&self) -> Result<()> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(CoreError::SendFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;
    use std::task::{Context, Poll};

    /// Accepts at most `max_per_call` bytes per write and yields between writes
    struct TrickleWriter {
        accepted: Arc<StdMutex<Vec<u8>>>,
        max_per_call: usize,
        yield_next: bool,
    }

    impl TrickleWriter {
        fn new(max_per_call: usize) -> (Self, Arc<StdMutex<Vec<u8>>>) {
            let accepted = Arc::new(StdMutex::new(Vec::new()));
            let writer = Self {
                accepted: Arc::clone(&accepted),
                max_per_call,
                yield_next: false,
            };
            (writer, accepted)
        }
    }

    impl AsyncWrite for TrickleWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.yield_next {
                self.yield_next = false;
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
            self.yield_next = true;

            let n = buf.len().min(self.max_per_call);
            self.accepted.lock().unwrap().extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Reports zero bytes accepted, the way a closed peer does
    struct ClosedWriter;

    impl AsyncWrite for ClosedWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(0))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    struct FailingWriter;

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_partial_writes_are_completed() {
        let (writer, accepted) = TrickleWriter::new(3);
        let sender = LineSender::new(writer);

        sender.send(b"PRIVMSG #rust :hello\r\n").await.unwrap();

        assert_eq!(&*accepted.lock().unwrap(), b"PRIVMSG #rust :hello\r\n");
    }

    #[tokio::test]
    async fn test_zero_byte_write_is_connection_broken() {
        let sender = LineSender::new(ClosedWriter);
        let err = sender.send(b"NICK ferris\r\n").await.unwrap_err();
        assert!(matches!(err, CoreError::ConnectionBroken));
    }

    #[tokio::test]
    async fn test_write_error_is_send_failed() {
        let sender = LineSender::new(FailingWriter);
        let err = sender.send(b"NICK ferris\r\n").await.unwrap_err();
        match err {
            CoreError::SendFailed(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected SendFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_payload_writes_nothing() {
        let sender = LineSender::new(ClosedWriter);
        assert!(sender.send(b"").await.is_ok());
    }

    #[tokio::test]
    async fn test_send_command_appends_separator() {
        let (writer, accepted) = TrickleWriter::new(64);
        let sender = LineSender::new(writer);

        let command = Command::translate("join #chan").unwrap();
        sender.send_command(&command).await.unwrap();

        assert_eq!(&*accepted.lock().unwrap(), b"JOIN #chan\r\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_senders_do_not_interleave() {
        let (writer, accepted) = TrickleWriter::new(1);
        let sender = LineSender::new(writer);

        // One task stands in for the foreground, the other for PONG replies
        let foreground = {
            let sender = sender.clone();
            tokio::spawn(async move {
                for i in 0..25 {
                    let line = format!("PRIVMSG #chan :message {}\r\n", i);
                    sender.send(line.as_bytes()).await.unwrap();
                }
            })
        };
        let background = {
            let sender = sender.clone();
            tokio::spawn(async move {
                for i in 0..25 {
                    sender.send(format!("PONG :token-{}\r\n", i).as_bytes()).await.unwrap();
                }
            })
        };
        foreground.await.unwrap();
        background.await.unwrap();

        let accepted = String::from_utf8(accepted.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = accepted.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 50);

        let privmsgs: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.starts_with("PRIVMSG"))
            .collect();
        let pongs: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with("PONG")).collect();
        assert_eq!(privmsgs.len(), 25);
        assert_eq!(pongs.len(), 25);
        for (i, line) in privmsgs.iter().enumerate() {
            assert_eq!(*line, format!("PRIVMSG #chan :message {}", i));
        }
        for (i, line) in pongs.iter().enumerate() {
            assert_eq!(*line, format!("PONG :token-{}", i));
        }
    }
}
