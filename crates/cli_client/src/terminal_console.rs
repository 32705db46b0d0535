//! Console backed by the process's stdout and stderr
//!
//! Server lines go to stdout untouched. Errors and warnings go to stderr,
//! styled when stderr is a terminal. Verbose traces go through `tracing`.

use std::io::{self, Write};

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use irk_core::Console;

pub struct TerminalConsole {
    styled: bool,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            styled: io::stderr().is_tty(),
        }
    }

    /// Non-fatal notice for the user
    pub fn warning(&self, text: &str) {
        if self.styled {
            eprintln!("{}", text.yellow().bold());
        } else {
            eprintln!("{}", text);
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn echo(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        // Best-effort: a closed stdout must not take the session down
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }

    fn error(&self, message: &str) {
        if self.styled {
            eprintln!("{}", message.red().bold());
        } else {
            eprintln!("{}", message);
        }
    }

    fn verbose(&self, message: &str) {
        tracing::debug!(target: "irk::session", "{}", message);
    }
}
