//! Session controller
//!
//! Drives one IRC session from connect to teardown:
//! 1. Connect
//! 2. Login handshake (PASS, NICK, USER)
//! 3. Spawn the receiver task
//! 4. Forward interactive input until QUIT, end of input, interrupt or failure
//! 5. Shut down: stop flag, shut reads, join the receiver, close the socket

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::console::Console;
use crate::protocol::Command;
use crate::transport::{receiver, Connection, LineSender, StopSignal};
use crate::{CoreError, Result};

/// Printed when the session ends normally
pub const FAREWELL: &str = "Goodbye.";

/// Why the input loop stopped
#[derive(Debug)]
enum Trigger {
    Quit,
    EndOfInput,
    Interrupted,
    Failed(CoreError),
    /// The receiver ended on its own; its handle must not be awaited again
    ReceiverFinished(Result<()>),
}

/// One IRC session against one server
pub struct Session {
    config: SessionConfig,
    console: Arc<dyn Console>,
}

impl Session {
    pub fn new(config: SessionConfig, console: Arc<dyn Console>) -> Self {
        Self { config, console }
    }

    /// Run the session to completion
    ///
    /// `input` supplies interactive lines. `interrupt` resolves when the user
    /// asks to kill the process; teardown still runs and the interrupt is
    /// returned as `CoreError::Interrupted`.
    ///
    /// # Errors
    /// Connect, handshake, send and receive failures are reported to the
    /// console and returned after teardown.
    pub async fn run<I, S>(&self, input: I, interrupt: S) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        let connection = self.connect().await.inspect_err(|e| self.report(e))?;
        self.run_on(connection, input, interrupt).await
    }

    /// Run the session over an already open connection, starting with the
    /// login handshake
    pub async fn run_on<I, S>(
        &self,
        mut connection: Connection,
        input: I,
        interrupt: S,
    ) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        if let Err(e) = self.login(&connection.sender()).await {
            self.report(&e);
            connection.close().await;
            return Err(e);
        }

        let Some(reader) = connection.take_reader() else {
            connection.close().await;
            return Err(CoreError::ReceiverAborted("read half already taken".into()));
        };

        let sender = connection.sender();
        let stop = StopSignal::new();
        let console = Arc::clone(&self.console);
        let mut receiver = receiver::spawn(reader, sender.clone(), stop.clone(), console);

        let trigger = self.forward_input(&sender, &mut receiver, input, interrupt).await;
        self.console.verbose(&format!("Input loop ended: {:?}", trigger));

        let graceful = matches!(trigger, Trigger::Quit | Trigger::EndOfInput);
        let running = match trigger {
            Trigger::ReceiverFinished(_) => None,
            _ => Some(receiver),
        };
        let received = self.shutdown(connection, stop, running, graceful).await;

        self.conclude(trigger, received)
    }

    async fn connect(&self) -> Result<Connection> {
        let server = &self.config.server;
        self.console.verbose(&format!("About to connect to {}", server));

        let connection = Connection::connect(server).await?;

        self.console.verbose(&format!("Connected successfully to {}", server));
        Ok(connection)
    }

    /// Send the handshake lines in order; the first failure aborts
    async fn login(&self, sender: &LineSender<OwnedWriteHalf>) -> Result<()> {
        for command in Command::handshake(&self.config.identity) {
            self.trace_send(&command);
            sender.send_command(&command).await?;
        }
        Ok(())
    }

    async fn forward_input<I, S>(
        &self,
        sender: &LineSender<OwnedWriteHalf>,
        receiver: &mut JoinHandle<Result<()>>,
        input: I,
        interrupt: S,
    ) -> Trigger
    where
        I: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = input.lines();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                biased;

                _ = &mut interrupt => return Trigger::Interrupted,

                joined = &mut *receiver => {
                    let outcome = joined.map_err(CoreError::from).and_then(|r| r);
                    return Trigger::ReceiverFinished(outcome);
                }

                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        // Blank input is skipped
                        if let Some(command) = Command::translate(line.trim()) {
                            self.trace_send(&command);
                            // A server that stops reading must not block the interrupt
                            let sent = tokio::select! {
                                biased;
                                _ = &mut interrupt => return Trigger::Interrupted,
                                sent = sender.send_command(&command) => sent,
                            };
                            if let Err(e) = sent {
                                return Trigger::Failed(e);
                            }
                            if !command.keeps_session_open() {
                                return Trigger::Quit;
                            }
                        }
                    }
                    Ok(None) => return Trigger::EndOfInput,
                    Err(e) => return Trigger::Failed(CoreError::Io(e)),
                },
            }
        }
    }

    /// Tear everything down. Consumes the connection, so it runs once.
    ///
    /// A graceful stop only shuts reads down. Otherwise writes are shut down
    /// too, so a PONG stuck on a full socket buffer fails instead of hanging.
    ///
    /// Returns the receiver's outcome when it was still running, `Ok`
    /// otherwise.
    async fn shutdown(
        &self,
        connection: Connection,
        stop: StopSignal,
        receiver: Option<JoinHandle<Result<()>>>,
        graceful: bool,
    ) -> Result<()> {
        stop.set();

        self.console.verbose("Shutting down socket.");
        let shut = if graceful {
            connection.shutdown_read()
        } else {
            connection.shutdown_both()
        };
        if let Err(e) = shut {
            tracing::warn!("Socket shutdown failed: {}", e);
        }

        let received = match receiver {
            Some(handle) => {
                self.console.verbose("Waiting for receiver to terminate.");
                handle.await.map_err(CoreError::from).and_then(|r| r)
            }
            None => Ok(()),
        };

        self.console.verbose("Closing socket.");
        connection.close().await;

        received
    }

    fn conclude(&self, trigger: Trigger, received: Result<()>) -> Result<()> {
        match (trigger, received) {
            (Trigger::ReceiverFinished(Err(e)), _) => {
                self.report(&e);
                Err(e)
            }
            // Servers close the link right after QUIT
            (Trigger::Quit, Ok(()) | Err(CoreError::ConnectionClosed))
            | (Trigger::EndOfInput, Ok(()))
            | (Trigger::ReceiverFinished(Ok(())), _) => {
                self.console.echo(FAREWELL);
                Ok(())
            }
            (Trigger::Interrupted, received) => {
                if let Err(e) = received {
                    self.report(&e);
                }
                Err(CoreError::Interrupted)
            }
            (Trigger::Failed(e), received) => {
                if let Err(other) = received {
                    tracing::debug!("Receiver also failed: {}", other);
                }
                self.report(&e);
                Err(e)
            }
            (_, Err(e)) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    fn trace_send(&self, command: &Command) {
        if command.verb() == "PASS" {
            self.console.verbose("Sending: PASS ********");
        } else {
            self.console.verbose(&format!("Sending: {}", command));
        }
    }

    fn report(&self, error: &CoreError) {
        self.console.error(&error.to_string());
    }
}
