//! Irk - a dumb little IRC client
//!
//! Connects to one server, logs in, then relays typed lines to the server
//! and server lines to the terminal until QUIT, end of input or Ctrl+C.

mod terminal_console;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use irk_core::{CoreError, Identity, ServerAddress, Session, SessionConfig};
use tokio::io::BufReader;
use tokio::signal;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::terminal_console::TerminalConsole;

/// Exit code after Ctrl+C / SIGTERM (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

/// Irk - a dumb little IRC client
#[derive(Parser, Debug)]
#[command(name = "irk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A dumb little IRC client", long_about = None)]
#[command(after_help = "Example:\n  irk irc.libera.chat")]
struct Args {
    /// The IRC server to connect to, HOST[:PORT] (port defaults to 6667)
    server: ServerAddress,

    /// Show verbose logging details
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error); overrides --verbose
    #[arg(short, long)]
    log_level: Option<String>,

    /// Connection password sent with PASS
    #[arg(long, env = "IRK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Nickname sent with NICK
    #[arg(long, env = "IRK_NICK")]
    nick: Option<String>,

    /// Username sent with USER
    #[arg(long, env = "IRK_USER")]
    user: Option<String>,

    /// Real name sent with USER
    #[arg(long, env = "IRK_REALNAME")]
    realname: Option<String>,
}

impl Args {
    fn identity(&self) -> Identity {
        let mut identity = Identity::default();
        if let Some(password) = &self.password {
            identity = identity.with_password(password);
        }
        if let Some(nick) = &self.nick {
            identity = identity.with_nickname(nick);
        }
        if let Some(user) = &self.user {
            identity = identity.with_username(user);
        }
        if let Some(realname) = &self.realname {
            identity = identity.with_realname(realname);
        }
        identity
    }

    fn log_level(&self) -> &str {
        match (&self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => "debug",
            (None, false) => "warn",
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    setup_logging(args.log_level())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let code = runtime.block_on(run(args));

    // Stdin is read on a blocking thread that may never return
    runtime.shutdown_background();

    Ok(code)
}

async fn run(args: Args) -> ExitCode {
    tracing::debug!("The user provided this value for HOST: {}", args.server);

    let console = Arc::new(TerminalConsole::new());
    let config = SessionConfig::new(args.server.clone()).with_identity(args.identity());
    let session = Session::new(config, console.clone());

    let input = BufReader::new(tokio::io::stdin());

    match session.run(input, interrupted()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CoreError::Interrupted) => {
            println!();
            console.warning("You killed the process. Goodbye.");
            tracing::debug!("User killed the process. Goodbye.");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        // Already reported by the session
        Err(e) => {
            tracing::debug!("Session ended with error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn interrupted() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => tracing::debug!("Received Ctrl+C"),
                    _ = sigterm.recv() => tracing::debug!("Received SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a handler there is nothing to wait for
        tracing::warn!("Ctrl+C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Setup logging with tracing
fn setup_logging(level: &str) -> Result<()> {
    let log_level = level.parse::<Level>().unwrap_or(Level::WARN);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
