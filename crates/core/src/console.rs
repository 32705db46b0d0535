//! Console abstraction for session output
//!
//! The session never prints directly. It reports through a [`Console`]
//! injected once at construction; the CLI supplies a terminal-backed one.

use std::sync::Mutex;

/// Output sinks used by the session
pub trait Console: Send + Sync {
    /// A line for the user (received server lines, farewell)
    fn echo(&self, line: &str);

    /// A fatal condition
    fn error(&self, message: &str);

    /// Diagnostic trace of protocol events
    fn verbose(&self, _message: &str) {}
}

/// What a [`MemoryConsole`] was asked to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEntry {
    Echo(String),
    Error(String),
    Verbose(String),
}

/// In-memory console for testing
#[derive(Debug, Default)]
pub struct MemoryConsole {
    entries: Mutex<Vec<ConsoleEntry>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far, in order
    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Only the echoed lines
    pub fn echoed(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                ConsoleEntry::Echo(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Only the error messages
    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                ConsoleEntry::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, entry: ConsoleEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

impl Console for MemoryConsole {
    fn echo(&self, line: &str) {
        self.push(ConsoleEntry::Echo(line.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(ConsoleEntry::Error(message.to_string()));
    }

    fn verbose(&self, message: &str) {
        self.push(ConsoleEntry::Verbose(message.to_string()));
    }
}
