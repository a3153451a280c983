//! Single-flight translation worker.
//!
//! Owns the current-translation state, the bounded pending-job queue, and
//! the sliding context window. At most one backend call is ever in flight;
//! work submitted while busy queues (bounded, oldest dropped) and drains
//! strictly FIFO. The lock covers only field reads and writes — never the
//! network call itself.

use crate::backend::Translator;
use crate::cache::{MemoryCache, SqliteStore};
use crate::classify::is_trivial;
use crate::defaults::{CONTEXT_MIN_CHARS, CONTEXT_TAIL, MINI_CONTEXT_MAX};
use crate::speaker::extract_speaker;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Snapshot of the latest translation, published to observers.
///
/// `id` increments by exactly one on every text-bearing update (cache
/// hit, success, error) and only returns to zero through `reset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTranslation {
    pub text: String,
    pub id: u64,
    pub busy: bool,
    pub context_active: bool,
}

struct WorkerState {
    current: CurrentTranslation,
    pending: VecDeque<String>,
    mini_context: VecDeque<String>,
}

/// The translation worker. One instance per process, shared behind `Arc`.
pub struct Worker {
    translator: Arc<dyn Translator>,
    ram: Arc<MemoryCache>,
    store: Arc<SqliteStore>,
    known_names: HashSet<String>,
    pending_max: usize,
    verbosity: u8,
    state: Mutex<WorkerState>,
}

impl Worker {
    pub fn new(
        translator: Arc<dyn Translator>,
        ram: Arc<MemoryCache>,
        store: Arc<SqliteStore>,
        known_names: HashSet<String>,
        pending_max: usize,
    ) -> Self {
        Self {
            translator,
            ram,
            store,
            known_names,
            pending_max,
            verbosity: 0,
            state: Mutex::new(WorkerState {
                current: CurrentTranslation::default(),
                pending: VecDeque::new(),
                mini_context: VecDeque::new(),
            }),
        }
    }

    /// Sets the verbosity level for status lines.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Snapshot copy of the current translation.
    pub fn current(&self) -> CurrentTranslation {
        self.lock_state().current.clone()
    }

    /// Reset to the initial state: zeroed current translation, empty
    /// queue, empty context window.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.current = CurrentTranslation::default();
        state.pending.clear();
        state.mini_context.clear();
    }

    /// Direct-set path for the watcher's immediate cache hit.
    ///
    /// Bypasses the pipeline entirely: bumps the id, clears the context
    /// flag, touches nothing else. Guarded by the worker lock so it never
    /// races a pipeline update.
    pub fn set_current_direct(&self, text: &str) {
        let mut state = self.lock_state();
        state.current.text = text.to_string();
        state.current.id += 1;
        state.current.context_active = false;
    }

    /// Cache-only lookup: RAM tier first, then the durable tier with
    /// promotion back into RAM. Never triggers a backend call. A durable
    /// tier failure degrades to a miss.
    pub fn lookup_cached(&self, text: &str) -> Option<String> {
        if let Some(hit) = self.ram.get(text) {
            return Some(hit);
        }

        match self.store.get(text) {
            Ok(Some(hit)) => {
                self.ram.set(text, &hit);
                Some(hit)
            }
            Ok(None) => None,
            Err(e) => {
                if self.verbosity >= 1 {
                    eprintln!("clipglot: [store] read failed, treating as miss: {e}");
                }
                None
            }
        }
    }

    /// Submit a text for translation.
    ///
    /// If a translation is already in flight the text is queued (bounded;
    /// the oldest queued entry is dropped on overflow) and this returns
    /// immediately. Otherwise the text is processed now, followed by an
    /// iterative drain of whatever queued up in the meantime.
    pub async fn submit(&self, text: String) {
        {
            let mut state = self.lock_state();
            if state.current.busy {
                state.pending.push_back(text);
                if state.pending.len() > self.pending_max {
                    state.pending.pop_front();
                }
                if self.verbosity >= 1 {
                    eprintln!("clipglot: [queue] busy, queued ({})", state.pending.len());
                }
                return;
            }
            state.current.busy = true;
        }

        // Drain loop. Busy stays held between jobs so concurrent submits
        // keep queueing; it clears only once the queue is empty.
        let mut next = Some(text);
        while let Some(job) = next {
            self.process(job).await;

            next = {
                let mut state = self.lock_state();
                match state.pending.pop_front() {
                    Some(queued) => {
                        if self.verbosity >= 1 {
                            eprintln!(
                                "clipglot: [queue] dequeued, {} remaining",
                                state.pending.len()
                            );
                        }
                        Some(queued)
                    }
                    None => {
                        state.current.busy = false;
                        None
                    }
                }
            };
        }
    }

    /// Run one admitted text through the pipeline.
    async fn process(&self, text: String) {
        // Speaker split is informational context, not a filter.
        let (_speaker, dialogue) = extract_speaker(&text, &self.known_names);

        // A single trivial line is abandoned without touching the backend,
        // the cache, or the id. Multi-line blocks always go through — a
        // trivial-looking first line can still matter inside a batch.
        let line_count = text.lines().filter(|l| !l.trim().is_empty()).count();
        if line_count <= 1 && is_trivial(&dialogue) {
            if self.verbosity >= 1 {
                eprintln!("clipglot: [skip] trivial: {dialogue}");
            }
            self.lock_state().current.context_active = false;
            return;
        }

        // Two-tier cache: hit short-circuits the backend entirely.
        if let Some(cached) = self.lookup_cached(&text) {
            if self.verbosity >= 1 {
                eprintln!("clipglot: [cache] hit");
            }
            let mut state = self.lock_state();
            state.current.text = cached;
            state.current.id += 1;
            state.current.context_active = false;
            return;
        }

        // Decide context use and record the flag before the call runs,
        // so observers see it for the translation in flight.
        let context = {
            let mut state = self.lock_state();
            let use_context =
                text.chars().count() > CONTEXT_MIN_CHARS && !state.mini_context.is_empty();
            state.current.context_active = use_context;

            if use_context {
                let skip = state.mini_context.len().saturating_sub(CONTEXT_TAIL);
                state
                    .mini_context
                    .iter()
                    .skip(skip)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                String::new()
            }
        };

        // The external call runs outside the lock.
        match self.translator.translate(&text, &context).await {
            Ok(result) => {
                let result = result.trim().to_string();

                self.ram.set(&text, &result);
                if let Err(e) = self.store.set(&text, &result) {
                    // Durable tier unavailability must not abort the job.
                    if self.verbosity >= 1 {
                        eprintln!("clipglot: [store] write failed: {e}");
                    }
                }

                let mut state = self.lock_state();
                state.current.text = result.clone();
                state.current.id += 1;

                if !is_trivial(&dialogue) {
                    state.mini_context.push_back(result);
                    if state.mini_context.len() > MINI_CONTEXT_MAX {
                        state.mini_context.pop_front();
                    }
                }
            }
            Err(e) => {
                if self.verbosity >= 1 {
                    eprintln!("clipglot: [backend] {e}");
                }
                let mut state = self.lock_state();
                state.current.text = format!("[error: {e}]");
                state.current.id += 1;
            }
        }
    }

    /// Number of queued pending jobs.
    pub fn pending_len(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Copy of the sliding context window, oldest first.
    pub fn mini_context_snapshot(&self) -> Vec<String> {
        self.lock_state().mini_context.iter().cloned().collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        // Poisoning only happens if a holder panicked; state mutations
        // are simple field writes, so continue with what's there.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
