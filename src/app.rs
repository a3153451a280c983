//! Daemon composition root: wires the watcher, worker, caches and IPC
//! server together and runs until a signal or a `shutdown` command.

use crate::accumulator::{Accumulator, AccumulatorConfig};
use crate::backend::HttpTranslator;
use crate::cache::{MemoryCache, SqliteStore};
use crate::config::Config;
use crate::error::{Result, ClipglotError};
use crate::ipc::protocol::{Command, Response};
use crate::ipc::server::{CommandHandler, IpcServer};
use crate::speaker::default_known_names;
use crate::watcher::{CommandSource, Watcher};
use crate::worker::Worker;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Everything the IPC handler needs to answer commands.
pub struct DaemonState {
    pub worker: Arc<Worker>,
    pub ram: Arc<MemoryCache>,
    pub store: Arc<SqliteStore>,
    pub accumulator: Arc<Mutex<Accumulator>>,
    /// Signalled by the `shutdown` command; the run loop waits on it.
    pub shutdown: Arc<Notify>,
}

/// IPC command handler backed by the live daemon state.
pub struct DaemonCommandHandler {
    state: DaemonState,
    quiet: bool,
    verbosity: u8,
}

impl DaemonCommandHandler {
    pub fn new(state: DaemonState, quiet: bool, verbosity: u8) -> Self {
        Self {
            state,
            quiet,
            verbosity,
        }
    }

    fn reset(&self) -> Response {
        self.state.worker.reset();
        // Pending shorts would otherwise surface after the reset.
        self.state
            .accumulator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .force_flush();
        if self.verbosity >= 1 {
            eprintln!("clipglot: [daemon] state reset");
        }
        Response::Ok
    }

    fn history(&self, limit: usize) -> Response {
        match self.state.store.recent(limit) {
            Ok(entries) => Response::History { entries },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }
}

#[async_trait::async_trait]
impl CommandHandler for DaemonCommandHandler {
    async fn handle(&self, command: Command) -> Response {
        match command {
            Command::Translation => Response::Translation {
                current: self.state.worker.current(),
            },
            Command::Reset => self.reset(),
            Command::CacheStats => Response::CacheStats {
                stats: self.state.ram.stats(),
            },
            Command::History { limit } => self.history(limit),
            Command::Shutdown => {
                if !self.quiet {
                    eprintln!("clipglot: shutdown requested over IPC");
                }
                self.state.shutdown.notify_one();
                Response::Ok
            }
        }
    }
}

/// Run the daemon: open the caches, start the watcher and the IPC
/// server, wait for shutdown.
pub async fn run_daemon(
    config: Config,
    socket_path: Option<PathBuf>,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    let known_names = default_known_names();

    // Fail fast on a missing credential before any thread starts.
    let translator = Arc::new(HttpTranslator::new(&config.backend, known_names.clone())?);

    let db_path = config.cache.resolved_db_path();
    let store = Arc::new(SqliteStore::open(&db_path)?);
    let ram = Arc::new(MemoryCache::new(config.cache.ram_capacity));

    if !quiet {
        eprintln!(
            "clipglot: durable cache at {} ({} entries)",
            db_path.display(),
            store.count().unwrap_or(0)
        );
    }

    let worker = Arc::new(
        Worker::new(
            translator,
            Arc::clone(&ram),
            Arc::clone(&store),
            known_names,
            config.worker.pending_max,
        )
        .with_verbosity(verbosity),
    );

    let accumulator = Arc::new(Mutex::new(Accumulator::new(AccumulatorConfig {
        timeout: config.buffer.timeout(),
        short_threshold_chars: config.buffer.short_threshold_chars,
        max_items: config.buffer.max_items,
    })));

    let source = CommandSource::new(&config.watcher.source_command)?;
    let watcher = Watcher::new(
        Box::new(source),
        Arc::clone(&worker),
        Arc::clone(&accumulator),
        &config.watcher,
        tokio::runtime::Handle::current(),
    )
    .with_verbosity(verbosity);
    let watcher_handle = watcher.start();

    if !quiet {
        eprintln!(
            "clipglot: watching '{}' every {}ms",
            config.watcher.source_command.join(" "),
            config.watcher.poll_interval_ms
        );
    }

    let socket_path = socket_path.unwrap_or_else(IpcServer::default_socket_path);
    let server = Arc::new(IpcServer::new(socket_path)?);

    if !quiet {
        eprintln!(
            "clipglot: IPC server listening at {}",
            server.socket_path().display()
        );
        eprintln!("clipglot: daemon ready");
    }

    let shutdown = Arc::new(Notify::new());
    let state = DaemonState {
        worker,
        ram,
        store,
        accumulator,
        shutdown: Arc::clone(&shutdown),
    };
    let handler = DaemonCommandHandler::new(state, quiet, verbosity);

    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(handler).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                eprintln!("\nclipglot: received SIGINT, shutting down...");
            }
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                eprintln!("clipglot: error setting up signal handler: {e}");
            }
            if !quiet {
                eprintln!("\nclipglot: received SIGTERM, shutting down...");
            }
        }
        _ = shutdown.notified() => {
            if !quiet {
                eprintln!("clipglot: shutting down...");
            }
        }
    }

    // Give the shutdown response a chance to reach the client before
    // the socket disappears.
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.stop()?;
    if let Err(e) = server_handle.await {
        eprintln!("clipglot: daemon server task failed: {e}");
    }

    watcher_handle.stop();

    if !quiet {
        eprintln!("clipglot: daemon stopped");
    }

    Ok(())
}

/// Wait for SIGTERM (systemd sends this on unit stop).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| ClipglotError::Other(format!("failed to register SIGTERM handler: {e}")))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTranslator;
    use crate::defaults;

    fn test_state() -> DaemonState {
        let translator = Arc::new(MockTranslator::new());
        let ram = Arc::new(MemoryCache::new(10));
        let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
        let worker = Arc::new(Worker::new(
            translator,
            Arc::clone(&ram),
            Arc::clone(&store),
            default_known_names(),
            defaults::PENDING_MAX,
        ));
        let accumulator = Arc::new(Mutex::new(Accumulator::new(AccumulatorConfig::default())));
        DaemonState {
            worker,
            ram,
            store,
            accumulator,
            shutdown: Arc::new(Notify::new()),
        }
    }

    #[tokio::test]
    async fn translation_returns_current_state() {
        let state = test_state();
        state.worker.set_current_direct("bonjour");
        let handler = DaemonCommandHandler::new(state, true, 0);

        match handler.handle(Command::Translation).await {
            Response::Translation { current } => {
                assert_eq!(current.text, "bonjour");
                assert_eq!(current.id, 1);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reset_clears_worker_and_accumulator() {
        let state = test_state();
        state.worker.set_current_direct("stale");
        state
            .accumulator
            .lock()
            .expect("lock")
            .push("hey");
        let accumulator = Arc::clone(&state.accumulator);
        let worker = Arc::clone(&state.worker);
        let handler = DaemonCommandHandler::new(state, true, 0);

        let response = handler.handle(Command::Reset).await;
        assert!(matches!(response, Response::Ok));
        assert_eq!(worker.current().text, "");
        assert!(accumulator.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn cache_stats_reports_ram_tier() {
        let state = test_state();
        state.ram.set("hello", "bonjour");
        let handler = DaemonCommandHandler::new(state, true, 0);

        match handler.handle(Command::CacheStats).await {
            Response::CacheStats { stats } => {
                assert_eq!(stats.size, 1);
                assert_eq!(stats.capacity, 10);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn history_returns_stored_entries() {
        let state = test_state();
        state.store.set("hello there", "bonjour").expect("set");
        let handler = DaemonCommandHandler::new(state, true, 0);

        match handler.handle(Command::History { limit: 5 }).await {
            Response::History { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].value, "bonjour");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_signals_the_notify() {
        let state = test_state();
        let shutdown = Arc::clone(&state.shutdown);
        let handler = DaemonCommandHandler::new(state, true, 0);

        let response = handler.handle(Command::Shutdown).await;
        assert!(matches!(response, Response::Ok));

        // notify_one stores a permit, so a later wait completes at once
        tokio::time::timeout(Duration::from_millis(100), shutdown.notified())
            .await
            .expect("shutdown permit should be stored");
    }
}
