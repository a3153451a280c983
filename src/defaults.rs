//! Default configuration constants for clipglot.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Default snapshot poll interval in milliseconds.
///
/// 100ms keeps the watcher responsive to clipboard changes without
/// noticeable CPU cost; the source command itself is the dominant expense.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Default maximum snapshot length in characters.
///
/// Snapshots longer than this are ignored entirely. Very long selections
/// are almost never live dialogue and would dominate backend latency.
pub const MAX_SNAPSHOT_LEN: usize = 500;

/// Default command used to read the polled text source.
///
/// `wl-paste --no-newline` reads the Wayland clipboard. Any command that
/// prints the current snapshot to stdout works here.
pub const SOURCE_COMMAND: &[&str] = &["wl-paste", "--no-newline"];

/// Default character threshold below which a line counts as "short".
///
/// Short lines are accumulated into batches instead of being dispatched
/// individually.
pub const SHORT_THRESHOLD_CHARS: usize = 10;

/// Default maximum number of short lines held before an implicit flush.
pub const SHORT_MAX_ITEMS: usize = 3;

/// Default accumulator timeout in seconds.
///
/// Once this much time passes after the last short push, the watcher
/// force-flushes whatever is buffered so fragments are never held forever.
pub const ACCUMULATOR_TIMEOUT_SECS: f64 = 1.3;

/// Guard margin added to the accumulator timeout, in milliseconds.
///
/// Compensates for poll-tick granularity so a flush never fires a tick
/// early.
pub const FLUSH_GUARD_MS: u64 = 150;

/// Default RAM cache capacity (number of entries).
pub const RAM_CACHE_CAPACITY: usize = 500;

/// Normalized keys longer than this many characters are replaced by a
/// content hash. Bounds key size for very long passages.
pub const MAX_PLAIN_KEY_LEN: usize = 200;

/// Default maximum number of queued pending jobs in the worker.
///
/// When the queue is full the oldest entry is dropped, favoring newer work.
pub const PENDING_MAX: usize = 20;

/// Maximum number of entries kept in the worker's sliding context window.
pub const MINI_CONTEXT_MAX: usize = 8;

/// Number of most recent context entries supplied to the backend.
pub const CONTEXT_TAIL: usize = 5;

/// Texts at or below this length never receive translation context.
///
/// Very short lines gain nothing from context and the extra prompt tokens
/// measurably slow the backend down.
pub const CONTEXT_MIN_CHARS: usize = 25;

/// Default chat-completions endpoint for the translation backend.
pub const BACKEND_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Default backend model name.
pub const BACKEND_MODEL: &str = "deepseek-chat";

/// Default backend sampling temperature.
///
/// Low temperature keeps translations stable across repeated snapshots,
/// which also improves cache usefulness.
pub const BACKEND_TEMPERATURE: f32 = 0.25;

/// Default backend request timeout in seconds.
pub const BACKEND_TIMEOUT_SECS: u64 = 60;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "CLIPGLOT_API_KEY";

/// Default number of history entries returned by the history query.
pub const HISTORY_LIMIT: usize = 30;
