//! Translation backend seam.
//!
//! The worker only needs one capability from the outside world: turn a
//! text (plus optional context) into a translated string, or fail. This
//! trait allows swapping implementations (real HTTP backend vs mock).

pub mod http;

pub use http::HttpTranslator;

use crate::error::{ClipglotError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait for the external translation call.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`, optionally informed by `context` (previous
    /// translated lines, newline-joined; empty when unused).
    async fn translate(&self, text: &str, context: &str) -> Result<String>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &str;
}

/// Scripted response for the mock backend.
enum Scripted {
    Reply(String),
    Fail(String),
}

/// Mock translator for testing.
///
/// Replays scripted responses in order; once the script is exhausted it
/// echoes `translated: <text>`. Records every call it receives.
pub struct MockTranslator {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn push_reply(&self, reply: &str) {
        self.lock_script().push_back(Scripted::Reply(reply.to_string()));
    }

    /// Queue a failure.
    pub fn push_failure(&self, message: &str) {
        self.lock_script().push_back(Scripted::Fail(message.to_string()));
    }

    /// All `(text, context)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, context: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((text.to_string(), context.to_string()));

        match self.lock_script().pop_front() {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(ClipglotError::BackendRequest { message }),
            None => Ok(format!("translated: {text}")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
