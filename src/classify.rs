//! Snapshot classification: trivial / short / long.
//!
//! Pure functions — no state, no I/O. The watcher uses these to decide
//! whether a snapshot is worth translating and how to route it.

use crate::speaker::extract_speaker;
use std::collections::HashSet;

/// Classification of a text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// No translatable meaning — discard.
    Trivial,
    /// Below the short threshold — eligible for accumulation.
    Short,
    /// At or above the short threshold — dispatched directly.
    Long,
}

/// Result of classifying a snapshot.
///
/// Speaker detection is informational only: it never changes the kind,
/// it just helps the backend understand attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: Kind,
    pub speaker: Option<String>,
    pub dialogue: String,
}

/// Short interjections that carry no translatable meaning.
const INTERJECTIONS: &[&str] = &[
    "uh", "um", "eh", "oh", "ah", "hmm", "hm", "mmm", "euh", "äh",
];

/// Punctuation and pause characters. A string made only of these is
/// trivial (ellipses, exclamation runs, CJK sokuon stutters).
fn is_pause_char(c: char) -> bool {
    matches!(
        c,
        '.' | '!'
            | '?'
            | '…'
            | '·'
            | ','
            | ';'
            | ':'
            | '¡'
            | '¿'
            | '-'
            | '–'
            | '—'
            | '。'
            | '・'
            | '！'
            | '？'
            | 'っ'
            | 'ッ'
    )
}

/// Quote characters stripped before judging triviality.
fn is_quote_char(c: char) -> bool {
    matches!(
        c,
        '「' | '」' | '『' | '』' | '"' | '\'' | '«' | '»' | '“' | '”' | '‘' | '’'
    )
}

/// Returns true if the text carries no translatable meaning.
///
/// Judged after trimming surrounding whitespace and quoting: empty,
/// a single character, punctuation/pause characters only, one repeated
/// character, or a known interjection.
pub fn is_trivial(text: &str) -> bool {
    let t = text.trim_matches(|c: char| c.is_whitespace() || is_quote_char(c));

    if t.is_empty() {
        return true;
    }

    if t.chars().count() <= 1 {
        return true;
    }

    if t.chars().all(is_pause_char) {
        return true;
    }

    // Single repeated character, case-insensitive ("mmm", "aaa", "???")
    let distinct: HashSet<char> = t.chars().flat_map(|c| c.to_lowercase()).collect();
    if distinct.len() == 1 {
        return true;
    }

    let lower = t.to_lowercase();
    INTERJECTIONS.contains(&lower.as_str())
}

/// Returns true if the trimmed text is below the short threshold.
pub fn is_short(text: &str, threshold_chars: usize) -> bool {
    text.trim().chars().count() < threshold_chars
}

/// Classify a snapshot and attach speaker attribution.
pub fn classify(text: &str, threshold_chars: usize, known_names: &HashSet<String>) -> Classification {
    let (speaker, dialogue) = extract_speaker(text, known_names);

    let kind = if is_trivial(text) {
        Kind::Trivial
    } else if is_short(text, threshold_chars) {
        Kind::Short
    } else {
        Kind::Long
    };

    Classification {
        kind,
        speaker,
        dialogue,
    }
}
