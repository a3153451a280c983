//! clipglot - Live clipboard translation for Wayland Linux
//!
//! Watches a text source (the clipboard by default), batches short
//! lines, and translates through a chat-completions backend with a
//! two-tier cache in front of it.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod accumulator;
pub mod app;
pub mod backend;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod ipc;
pub mod speaker;
pub mod watcher;
pub mod worker;

// Core seams (source → worker → backend)
pub use backend::{MockTranslator, Translator};
pub use watcher::{CommandSource, ScriptedSource, TextSource, Watcher, WatcherEvent};
pub use worker::{CurrentTranslation, Worker};

// Caching
pub use cache::{CacheStats, MemoryCache, SqliteStore, StoredTranslation};

// Error handling
pub use error::{ClipglotError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
