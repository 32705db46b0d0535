//! Irk Core - streaming engine for a minimal interactive IRC client
//!
//! This crate provides:
//! - TCP transport with serialized sends and read-side shutdown
//! - Line framing for the inbound byte stream
//! - Command translation for user input
//! - The background receive loop (with automatic PONG replies)
//! - The session controller tying it together
//! - Console abstraction and error types

pub mod config;
pub mod console;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export common types
pub use config::{Identity, ServerAddress, SessionConfig, DEFAULT_PORT};
pub use console::{Console, ConsoleEntry, MemoryConsole};
pub use error::{CoreError, Result};
pub use protocol::{Command, LineFramer, LINE_SEPARATOR};
pub use session::{Session, FAREWELL};
pub use transport::{Connection, LineSender, StopSignal};
