//! Short-line accumulator.
//!
//! Short fragments (names, interjections, partial lines) frequently arrive
//! split across several snapshots. Buffering up to a small fixed count and
//! joining them bounds the added latency while giving the backend a
//! coherent block to translate. The accumulator only buffers — it never
//! decides whether something gets translated.

use crate::classify::is_short;
use std::time::{Duration, Instant};

/// Configuration for the accumulator.
#[derive(Debug, Clone)]
pub struct AccumulatorConfig {
    /// Idle time after the last push before a timeout flush is due.
    pub timeout: Duration,
    /// Lines at or above this length (in chars) are rejected by `push`.
    pub short_threshold_chars: usize,
    /// Buffered line count that triggers an implicit flush.
    pub max_items: usize,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(crate::defaults::ACCUMULATOR_TIMEOUT_SECS),
            short_threshold_chars: crate::defaults::SHORT_THRESHOLD_CHARS,
            max_items: crate::defaults::SHORT_MAX_ITEMS,
        }
    }
}

/// Buffer for pending short fragments.
///
/// Holds at most `max_items` entries; reaching the limit flushes
/// implicitly. Not internally synchronized — the watcher owns it.
pub struct Accumulator {
    config: AccumulatorConfig,
    buffer: Vec<String>,
    last_push: Option<Instant>,
}

impl Accumulator {
    pub fn new(config: AccumulatorConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            last_push: None,
        }
    }

    /// Push a fragment into the buffer.
    ///
    /// Rejects text that is empty after trimming or not short. When the
    /// push fills the buffer to `max_items`, flushes implicitly and
    /// returns the joined batch; otherwise returns None (still pending).
    pub fn push(&mut self, text: &str) -> Option<String> {
        let text = text.trim();

        if text.is_empty() {
            return None;
        }

        if !is_short(text, self.config.short_threshold_chars) {
            return None;
        }

        self.buffer.push(text.to_string());
        self.last_push = Some(Instant::now());

        if self.buffer.len() >= self.config.max_items {
            return self.flush();
        }

        None
    }

    /// Join and clear everything buffered.
    ///
    /// Entries are joined with newlines in arrival order, each trimmed,
    /// empties skipped. Returns None if nothing was buffered.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }

        let combined = smart_join(&self.buffer);
        self.buffer.clear();
        self.last_push = None;

        if combined.is_empty() {
            None
        } else {
            Some(combined)
        }
    }

    /// Alias for `flush` used where the caller is overriding the normal
    /// count/timeout policies (trivial discard, shutdown, reset).
    pub fn force_flush(&mut self) -> Option<String> {
        self.flush()
    }

    /// Non-destructive read of the joined pending content.
    pub fn peek_current(&self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(smart_join(&self.buffer))
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when content is pending and more than `timeout + guard` has
    /// elapsed since the last push.
    pub fn timed_out(&self, guard: Duration) -> bool {
        match self.last_push {
            Some(at) if !self.buffer.is_empty() => at.elapsed() > self.config.timeout + guard,
            _ => false,
        }
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }
}

/// Trim each part, skip empties, join with newlines.
fn smart_join(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator(max_items: usize) -> Accumulator {
        Accumulator::new(AccumulatorConfig {
            timeout: Duration::from_millis(50),
            short_threshold_chars: 10,
            max_items,
        })
    }

    #[test]
    fn push_rejects_long_text() {
        let mut acc = accumulator(3);
        assert_eq!(acc.push("this is definitely long"), None);
        assert!(acc.is_empty());
    }

    #[test]
    fn push_rejects_empty_text() {
        let mut acc = accumulator(3);
        assert_eq!(acc.push("   "), None);
        assert!(acc.is_empty());
    }

    #[test]
    fn push_accumulates_until_max_items() {
        let mut acc = accumulator(3);
        assert_eq!(acc.push("Hi"), None);
        assert_eq!(acc.push("!!"), None);
        let flushed = acc.push("Ok");
        assert_eq!(flushed.as_deref(), Some("Hi\n!!\nOk"));
        assert!(acc.is_empty());
    }

    #[test]
    fn flush_preserves_arrival_order() {
        let mut acc = accumulator(10);
        acc.push("one");
        acc.push("two");
        acc.push("three");
        assert_eq!(acc.flush().as_deref(), Some("one\ntwo\nthree"));
    }

    #[test]
    fn flush_on_empty_buffer_returns_none() {
        let mut acc = accumulator(3);
        assert_eq!(acc.flush(), None);
        assert_eq!(acc.force_flush(), None);
    }

    #[test]
    fn flush_clears_state() {
        let mut acc = accumulator(3);
        acc.push("hey");
        assert!(acc.flush().is_some());
        assert!(acc.is_empty());
        assert_eq!(acc.flush(), None);
        assert!(!acc.timed_out(Duration::ZERO));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut acc = accumulator(3);
        acc.push("a!");
        acc.push("b?");
        assert_eq!(acc.peek_current().as_deref(), Some("a!\nb?"));
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.flush().as_deref(), Some("a!\nb?"));
    }

    #[test]
    fn peek_on_empty_returns_none() {
        let acc = accumulator(3);
        assert_eq!(acc.peek_current(), None);
    }

    #[test]
    fn push_trims_fragments() {
        let mut acc = accumulator(2);
        acc.push("  hi  ");
        let flushed = acc.push(" there ");
        assert_eq!(flushed.as_deref(), Some("hi\nthere"));
    }

    #[test]
    fn timed_out_after_timeout_plus_guard() {
        let mut acc = accumulator(5);
        acc.push("hey");
        assert!(!acc.timed_out(Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(80));
        assert!(acc.timed_out(Duration::from_millis(10)));
    }

    #[test]
    fn empty_buffer_never_times_out() {
        let acc = accumulator(5);
        assert!(!acc.timed_out(Duration::ZERO));
    }
}
