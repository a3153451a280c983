//! Command-line interface for clipglot
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Live clipboard translation for Wayland Linux
#[derive(Parser, Debug)]
#[command(name = "clipglot", version, about = "Live clipboard translation daemon")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: watcher decisions, -vv: full worker trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a flush timeout string into a duration.
///
/// Supports any format accepted by `humantime`: bare numbers are read as
/// seconds (fractions allowed), otherwise `300ms`, `2s`, `1m30s` and so on.
fn parse_flush_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        if !secs.is_finite() || secs <= 0.0 {
            return Err("timeout must be a positive number of seconds".to_string());
        }
        return Ok(Duration::from_secs_f64(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (foreground process for systemd)
    Daemon {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/clipglot.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,

        /// Override the short-line flush timeout. Examples: 1.3, 800ms, 2s
        #[arg(long, value_name = "DURATION", value_parser = parse_flush_timeout)]
        flush_timeout: Option<Duration>,
    },

    /// Show the current translation via IPC
    Status {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/clipglot.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Clear the current translation, queue and context via IPC
    Reset {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/clipglot.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Show RAM cache statistics via IPC
    Stats {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/clipglot.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Show recent stored translations via IPC
    History {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/clipglot.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,

        /// Number of entries to show
        #[arg(long, short = 'n', value_name = "COUNT", default_value_t = crate::defaults::HISTORY_LIMIT)]
        limit: usize,
    },

    /// Stop a running daemon via IPC
    Shutdown {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/clipglot.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },
}
