//! Cache key normalization.
//!
//! Both cache tiers key on the same canonical form of a text, so a line
//! that differs only in whitespace runs, quote style, or ellipsis variant
//! still hits. Very long passages fall back to a content hash, which
//! bounds key size at the cost of human-readable keys.

use crate::defaults::MAX_PLAIN_KEY_LEN;
use sha2::{Digest, Sha256};

/// Quote variants unified to one canonical pair.
const QUOTE_MAP: &[(char, char)] = &[
    ('“', '"'),
    ('”', '"'),
    ('„', '"'),
    ('«', '"'),
    ('»', '"'),
    ('‘', '\''),
    ('’', '\''),
    ('‚', '\''),
    ('『', '「'),
    ('』', '」'),
];

/// Derive the canonical cache key for a text.
pub fn normalize_key(text: &str) -> String {
    // Collapse internal whitespace runs and trim
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    // Unify ellipsis and quote variants
    let mut normalized = collapsed.replace('…', "...");
    for &(from, to) in QUOTE_MAP {
        normalized = normalized.replace(from, &to.to_string());
    }

    let normalized = strip_spaces_around_quotes(&normalized);

    if normalized.chars().count() > MAX_PLAIN_KEY_LEN {
        return format!("{:x}", Sha256::digest(normalized.as_bytes()));
    }

    normalized
}

/// Remove spaces directly adjacent to quote characters, so `「 text 」`
/// and `「text」` share a key.
fn strip_spaces_around_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(c, '「' | '」' | '"' | '\'') {
            while out.ends_with(' ') {
                out.pop();
            }
            out.push(c);
            while chars.peek() == Some(&' ') {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }

    out
}
