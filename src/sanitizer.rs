// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Free-text content sanitizer.
//!
//! Removes, in order:
//! 1. `<` and `>` characters
//! 2. `javascript:` scheme prefixes
//! 3. `on<word>=` event-handler attributes
//! 4. `data:` scheme prefixes
//!
//! then trims surrounding whitespace. Matching is ASCII case-insensitive.
//!
//! This is a denylist. Encoded or otherwise obfuscated payloads (entity
//! escapes, percent-encoding, whitespace inside a scheme) pass through
//! untouched. Output must still be escaped wherever it is rendered.

use serde_json::Value;

const JAVASCRIPT_SCHEME: &str = "javascript:";
const DATA_SCHEME: &str = "data:";

/// Sanitize a piece of user-submitted text.
///
/// Idempotent: the four removal passes are repeated until none of them
/// changes the string, so removing one pattern can never splice together
/// another one that survives into the output.
pub fn sanitize(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = run_passes(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Sanitize an arbitrary JSON value. Anything but a string yields `""`.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}

fn run_passes(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let stripped = strip_matches(&stripped, |rest| match_literal(rest, JAVASCRIPT_SCHEME));
    let stripped = strip_matches(&stripped, match_event_handler);
    strip_matches(&stripped, |rest| match_literal(rest, DATA_SCHEME))
}

/// Remove every non-overlapping match, scanning left to right.
///
/// `matcher` is given the remainder of the string at each char boundary and
/// returns the byte length of the match starting there, if any. Matches are
/// ASCII-only so the cut points are always char boundaries.
fn strip_matches<F>(input: &str, matcher: F) -> String
where
    F: Fn(&str) -> Option<usize>,
{
    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while pos < input.len() {
        let rest = &input[pos..];
        if let Some(len) = matcher(rest) {
            pos += len;
            continue;
        }
        match rest.chars().next() {
            Some(c) => {
                out.push(c);
                pos += c.len_utf8();
            }
            None => break,
        }
    }
    out
}

fn match_literal(rest: &str, literal: &str) -> Option<usize> {
    rest.get(..literal.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(literal))
        .map(|_| literal.len())
}

/// `on`, one or more word characters, then `=`.
fn match_event_handler(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    if bytes.len() < 4 || !bytes[..2].eq_ignore_ascii_case(b"on") {
        return None;
    }
    let word_len = bytes[2..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    if word_len == 0 {
        return None;
    }
    let eq = 2 + word_len;
    (bytes.get(eq) == Some(&b'=')).then_some(eq + 1)
}

/// True when `text` still contains something the sanitizer removes.
pub fn contains_denylisted(text: &str) -> bool {
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with(|c| c == '<' || c == '>')
            || match_literal(rest, JAVASCRIPT_SCHEME).is_some()
            || match_literal(rest, DATA_SCHEME).is_some()
            || match_event_handler(rest).is_some()
        {
            return true;
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }
    false
}
