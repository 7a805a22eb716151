//! Helper functions for text normalization.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Continuation marker for a paragraph break inside one utterance.
pub const CONTINUATION: &str = "\n\t";

/// Collapse every run of two or more newlines into the `\n\t` continuation
/// marker, then trim.
///
/// A raw blank line never survives inside an utterance, which keeps the blank
/// line between PlatoText blocks unambiguous.
pub fn normalize_utterance(raw: &str) -> String {
    BLANK_RUN_RE.replace_all(raw, CONTINUATION).trim().to_string()
}

/// Normalize line endings to `\n`.
pub fn clean_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Speaker identifiers are compared case-insensitively.
pub fn same_speaker(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}
