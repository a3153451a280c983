//! Snapshot watcher: the polling loop that feeds the worker.
//!
//! Runs on its own thread from startup until shutdown. Each tick reads
//! the current snapshot, deduplicates, classifies, drives the short-line
//! accumulator, and hands admitted work to the worker. Submission is
//! fire-and-forget — the watcher never blocks on a translation.

use crate::accumulator::Accumulator;
use crate::classify::{is_short, is_trivial};
use crate::config::WatcherConfig;
use crate::defaults::FLUSH_GUARD_MS;
use crate::error::{ClipglotError, Result};
use crate::worker::Worker;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A polled source of raw text snapshots.
pub trait TextSource: Send + 'static {
    /// Read the current snapshot. `Ok(None)` means the source has nothing
    /// to report this tick; errors are recoverable and skip the tick.
    fn read(&mut self) -> Result<Option<String>>;
}

/// Source that runs an external command and captures its stdout
/// (by default `wl-paste --no-newline` for the Wayland clipboard).
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| ClipglotError::ConfigInvalidValue {
                key: "watcher.source_command".to_string(),
                message: "must name a program".to_string(),
            })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl TextSource for CommandSource {
    fn read(&mut self) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| ClipglotError::Source {
                message: format!("failed to run {}: {e}", self.program),
            })?;

        if !output.status.success() {
            return Err(ClipglotError::Source {
                message: format!("{} exited with {}", self.program, output.status),
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| ClipglotError::Source {
            message: format!("{} produced non-UTF-8 output", self.program),
        })?;

        Ok(Some(text))
    }
}

/// In-memory source replaying a fixed sequence of snapshots. Used by
/// tests; once the script is exhausted every read returns `None`.
pub struct ScriptedSource {
    snapshots: std::collections::VecDeque<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            snapshots: snapshots.into_iter().map(Into::into).collect(),
        }
    }
}

impl TextSource for ScriptedSource {
    fn read(&mut self) -> Result<Option<String>> {
        Ok(self.snapshots.pop_front())
    }
}

/// Observable watcher decisions, streamed to an optional channel
/// (crossbeam, non-blocking). Tests subscribe to these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// Trivial snapshot discarded, along with any pending shorts.
    Discarded { text: String },
    /// Snapshot answered straight from the cache.
    CacheHit { text: String },
    /// A job was handed to the worker.
    Submitted { text: String },
    /// Pending shorts flushed because the accumulator timed out.
    TimeoutFlush { text: String },
}

/// The snapshot watcher.
pub struct Watcher {
    source: Box<dyn TextSource>,
    worker: Arc<Worker>,
    /// Shared with the daemon handler so a reset can discard pending shorts.
    accumulator: Arc<Mutex<Accumulator>>,
    short_threshold: usize,
    handle: tokio::runtime::Handle,
    poll_interval: Duration,
    max_snapshot_len: usize,
    guard: Duration,
    verbosity: u8,
    event_tx: Option<crossbeam_channel::Sender<WatcherEvent>>,
    last_raw: Option<String>,
    last_trimmed: Option<String>,
}

impl Watcher {
    pub fn new(
        source: Box<dyn TextSource>,
        worker: Arc<Worker>,
        accumulator: Arc<Mutex<Accumulator>>,
        config: &WatcherConfig,
        handle: tokio::runtime::Handle,
    ) -> Self {
        let short_threshold = lock_accumulator(&accumulator)
            .config()
            .short_threshold_chars;
        Self {
            source,
            worker,
            accumulator,
            short_threshold,
            handle,
            poll_interval: config.poll_interval(),
            max_snapshot_len: config.max_snapshot_len,
            guard: Duration::from_millis(FLUSH_GUARD_MS),
            verbosity: 0,
            event_tx: None,
            last_raw: None,
            last_trimmed: None,
        }
    }

    /// Sets the verbosity level for status lines.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Streams watcher decisions to `tx`.
    pub fn with_event_sender(mut self, tx: crossbeam_channel::Sender<WatcherEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Spawns the polling loop on a dedicated thread.
    pub fn start(mut self) -> WatcherHandle {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let poll_interval = self.poll_interval;

        let thread = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                self.tick();
                thread::sleep(poll_interval);
            }
        });

        WatcherHandle {
            running,
            thread: Some(thread),
        }
    }

    /// One polling tick. Public so tests can drive the state machine
    /// without threads or timers.
    pub fn tick(&mut self) {
        match self.source.read() {
            Ok(Some(raw)) => self.handle_snapshot(raw),
            Ok(None) => {}
            Err(e) => {
                if self.verbosity >= 2 {
                    eprintln!("clipglot: [source] {e}");
                }
            }
        }

        // Runs unconditionally, no matter which branch the tick took.
        self.check_timeout_flush();
    }

    fn handle_snapshot(&mut self, raw: String) {
        if raw.is_empty()
            || self.last_raw.as_deref() == Some(raw.as_str())
            || raw.chars().count() > self.max_snapshot_len
        {
            return;
        }
        self.last_raw = Some(raw.clone());

        let trimmed = raw.trim().to_string();
        // Duplicate content even when the raw source value differs
        if self.last_trimmed.as_deref() == Some(trimmed.as_str()) {
            return;
        }
        self.last_trimmed = Some(trimmed.clone());

        // Trivial: nothing gets translated, pending shorts are discarded —
        // a pause marker means the fragments before it went nowhere.
        if is_trivial(&trimmed) {
            self.lock_accumulator().force_flush();
            if self.verbosity >= 1 {
                eprintln!("clipglot: [skip] trivial snapshot");
            }
            self.emit(WatcherEvent::Discarded { text: trimmed });
            return;
        }

        // Known translation: show it immediately, no job submitted.
        if let Some(cached) = self.worker.lookup_cached(&trimmed) {
            self.lock_accumulator().force_flush();
            self.worker.set_current_direct(&cached);
            if self.verbosity >= 1 {
                eprintln!("clipglot: [cache] immediate hit");
            }
            self.emit(WatcherEvent::CacheHit { text: trimmed });
            return;
        }

        if !is_short(&trimmed, self.short_threshold) {
            // Long: pending shorts ride along in front, preserving order.
            match self.lock_accumulator().flush() {
                Some(pending) => {
                    let combined = format!("{pending}\n{trimmed}");
                    if self.verbosity >= 1 {
                        eprintln!("clipglot: [buffer] flush shorts + long");
                    }
                    self.submit(combined);
                }
                None => self.submit(trimmed),
            }
        } else {
            // Short: accumulate; a full buffer flushes implicitly.
            if let Some(batch) = self.lock_accumulator().push(&trimmed) {
                if self.verbosity >= 1 {
                    eprintln!("clipglot: [buffer] flush full batch");
                }
                self.submit(batch);
            }
        }
    }

    fn check_timeout_flush(&mut self) {
        let flushed = {
            let mut acc = self.lock_accumulator();
            if acc.timed_out(self.guard) {
                acc.flush()
            } else {
                None
            }
        };

        if let Some(flushed) = flushed {
            if self.verbosity >= 1 {
                eprintln!("clipglot: [buffer] timeout flush");
            }
            self.emit(WatcherEvent::TimeoutFlush {
                text: flushed.clone(),
            });
            self.submit(flushed);
        }
    }

    /// Non-blocking handoff to the worker.
    fn submit(&self, text: String) {
        self.emit(WatcherEvent::Submitted { text: text.clone() });
        let worker = Arc::clone(&self.worker);
        self.handle.spawn(async move {
            worker.submit(text).await;
        });
    }

    fn emit(&self, event: WatcherEvent) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }

    fn lock_accumulator(&self) -> MutexGuard<'_, Accumulator> {
        lock_accumulator(&self.accumulator)
    }
}

fn lock_accumulator(accumulator: &Mutex<Accumulator>) -> MutexGuard<'_, Accumulator> {
    accumulator.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to a running watcher thread.
pub struct WatcherHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Signals the loop to stop and joins the thread.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                eprintln!("clipglot: watcher thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
