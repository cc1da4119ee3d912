//! Local extractive summary
//!
//! The last tier of the chain. Needs no network and cannot fail.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Fragments must be longer than this (trimmed) to count as sentences
const MIN_SENTENCE_CHARS: usize = 10;

/// Texts with too few sentences are returned whole, cut to this length
const MAX_PASSTHROUGH_CHARS: usize = 200;

/// Upper bound on selected sentences
const MAX_SENTENCES: usize = 3;

/// Share of sentences kept
const SENTENCE_RATIO: f64 = 0.4;

fn sentence_breaks() -> &'static Regex {
    static BREAKS: OnceLock<Regex> = OnceLock::new();
    BREAKS.get_or_init(|| Regex::new(r"[.!?]+").expect("static sentence pattern"))
}

/// Build a summary by selecting the leading sentences of `text`
pub fn extractive_summary(text: &str) -> String {
    let sentences: Vec<&str> = sentence_breaks()
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect();

    if sentences.len() <= 2 {
        return truncate_with_ellipsis(text, MAX_PASSTHROUGH_CHARS);
    }

    let keep = ((sentences.len() as f64 * SENTENCE_RATIO).ceil() as usize).min(MAX_SENTENCES);

    let mut summary = sentences[..keep].join(". ");
    summary.push('.');
    summary
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
