//! Speaker attribution for dialogue snapshots.
//!
//! A small fixed registry of names the source is known to use, plus the
//! prefix patterns that attach one of them to a line of dialogue. The
//! registry is injected wherever it is needed so callers can swap in
//! their own cast.
//!
//! Lookup is a linear scan over the set. Fine at this size; a prefix
//! trie would only pay off with a much larger cast.

use std::collections::HashSet;

/// Names the speaker patterns will accept.
const KNOWN_NAMES: &[&str] = &[
    // Generic personal names
    "Alex", "Maria", "Juan", "Carlos", "Ana", "Luis", "Pedro", "Sofia", "Daniel", "Laura",
    "Miguel", "Elena", "Diego", "Paula",
    // Short / casual names
    "Tom", "Sam", "Leo", "Max", "Nico", "Vale",
    // Generic roles
    "Man", "Woman", "Boy", "Girl", "Child", "Adult", "Old man", "Old woman", "Clerk",
    "Customer", "Teacher", "Doctor", "Nurse", "Mother", "Father", "Brother", "Sister",
    // Narration-style speakers
    "Narrator", "Voice",
];

/// Build the default known-name registry.
pub fn default_known_names() -> HashSet<String> {
    KNOWN_NAMES.iter().map(|n| n.to_string()).collect()
}

/// Separators allowed between a glued name and its dialogue.
const NAME_SEPARATORS: &[char] = &[' ', '.', ',', ':', ';', '!', '?', '…'];

/// Try to split a snapshot into `(speaker, dialogue)`.
///
/// Patterns, in priority order — first match wins:
/// 1. An explicit `Name:` prefix (ASCII or fullwidth colon).
/// 2. A name occupying its own first line, the rest as dialogue.
/// 3. A name glued directly to the start of the text with no separator.
///
/// All patterns require the name to be in the registry and the trailing
/// dialogue to be non-empty. Returns `(None, original text)` when nothing
/// matches.
pub fn extract_speaker(text: &str, known_names: &HashSet<String>) -> (Option<String>, String) {
    let t = text.trim();
    if t.is_empty() || known_names.is_empty() {
        return (None, text.to_string());
    }

    // 1. Explicit "Name:" prefix
    if let Some((head, rest)) = t.split_once([':', '：']) {
        let name = head.trim();
        if known_names.contains(name) {
            let dialogue = rest.trim();
            if !dialogue.is_empty() {
                return (Some(name.to_string()), dialogue.to_string());
            }
        }
    }

    // Quote brackets around the whole snapshot don't affect attribution
    let stripped = t.trim_matches(['「', '」', '『', '』']);

    // 2. Name on its own first line
    if let Some((first, rest)) = stripped.split_once('\n') {
        let name = first.trim();
        if known_names.contains(name) {
            let dialogue = rest.trim();
            if !dialogue.is_empty() {
                return (Some(name.to_string()), dialogue.to_string());
            }
        }
    }

    // 3. Name glued to the start with no separator. Prefer the longest
    // matching name so "Old man" wins over a hypothetical "Old".
    let mut best: Option<&String> = None;
    for name in known_names {
        if stripped.starts_with(name.as_str()) && stripped.len() > name.len() {
            match best {
                Some(current) if current.len() >= name.len() => {}
                _ => best = Some(name),
            }
        }
    }
    if let Some(name) = best {
        let rest = &stripped[name.len()..];
        let dialogue = rest.trim_start_matches(NAME_SEPARATORS).trim();
        if !dialogue.is_empty() {
            return (Some(name.clone()), dialogue.to_string());
        }
    }

    (None, text.to_string())
}
