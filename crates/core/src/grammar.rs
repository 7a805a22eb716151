//! Block grammar for PlatoText documents.
//!
//! ```text
//! document := block ("\n\n" block)*
//! block    := speaker ":" SP* utterance
//! speaker  := [A-Za-z0-9_-]+
//! ```
//!
//! A blank line only separates blocks when the next line starts with a
//! speaker pattern; a stray blank line inside a turn stays part of that turn
//! and is folded into a `\n\t` continuation by [`normalize_utterance`].
//!
//! An utterance line shaped like `word:` right after a blank line does start a
//! new block. That follows the grammar and is not guarded against.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Conversion, Diagnostic, DiagnosticKind};
use crate::helpers::normalize_utterance;

static SPEAKER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+:").unwrap());
static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]+):\s*").unwrap());

/// One speaker's turn, before any role is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: String,
    pub content: String,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
        }
    }

    /// Render as a PlatoText block, including the blank line that ends it.
    pub fn to_plato_text(&self) -> String {
        format!("{}: {}\n\n", self.speaker, self.content)
    }
}

/// A block that does not start with `speaker:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedBlock;

/// Split a PlatoText document into trimmed, non-empty blocks.
pub fn split_blocks(text: &str) -> Vec<&str> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut block_start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'\n' && bytes[i + 1] == b'\n' && SPEAKER_PREFIX_RE.is_match(&text[i + 2..]) {
            blocks.push(&text[block_start..i]);
            i += 2;
            block_start = i;
        } else {
            i += 1;
        }
    }
    blocks.push(&text[block_start..]);

    blocks
        .into_iter()
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect()
}

/// Split one trimmed block into its speaker and normalized utterance.
pub fn parse_block(block: &str) -> Result<Turn, MalformedBlock> {
    let caps = BLOCK_RE.captures(block).ok_or(MalformedBlock)?;
    let prefix_len = caps.get(0).ok_or(MalformedBlock)?.end();
    Ok(Turn::new(&caps[1], normalize_utterance(&block[prefix_len..])))
}

/// Parse every well-formed block of a PlatoText document.
///
/// Blocks without a speaker are dropped and reported as diagnostics.
pub fn parse_turns(text: &str) -> Conversion<Vec<Turn>> {
    let mut turns = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, block) in split_blocks(text).into_iter().enumerate() {
        match parse_block(block) {
            Ok(turn) => turns.push(turn),
            Err(MalformedBlock) => {
                diagnostics.push(Diagnostic::new(index, DiagnosticKind::MissingSpeaker, block))
            }
        }
    }

    Conversion::new(turns, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_blocks() {
        let blocks = split_blocks("Alice: Hello there\n\nAtlas: Hi!\n\n");
        assert_eq!(blocks, vec!["Alice: Hello there", "Atlas: Hi!"]);
    }

    #[test]
    fn test_split_requires_speaker_after_blank_line() {
        let blocks = split_blocks("Alice: first\n\nstill Alice\n\nBob: reply");
        assert_eq!(blocks, vec!["Alice: first\n\nstill Alice", "Bob: reply"]);
    }

    #[test]
    fn test_split_tries_every_newline_pair() {
        // The pair right before the speaker splits; the leftover newline is trimmed.
        let blocks = split_blocks("Alice: one\n\n\nBob: two");
        assert_eq!(blocks, vec!["Alice: one", "Bob: two"]);
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_blocks("").is_empty());
        assert!(split_blocks(" \n\n\t ").is_empty());
    }

    #[test]
    fn test_parse_block() {
        assert_eq!(parse_block("Alice: Hello"), Ok(Turn::new("Alice", "Hello")));
        assert_eq!(parse_block("bob_2-x:no space"), Ok(Turn::new("bob_2-x", "no space")));
        assert_eq!(parse_block("Alice:\nnext line"), Ok(Turn::new("Alice", "next line")));
        assert_eq!(parse_block("Alice: one\n\n\ntwo"), Ok(Turn::new("Alice", "one\n\ttwo")));
        assert_eq!(parse_block("just some text"), Err(MalformedBlock));
        assert_eq!(parse_block("Dr. Who: hi"), Err(MalformedBlock));
    }

    #[test]
    fn test_parse_turns_drops_malformed_blocks() {
        let parsed = parse_turns("just some text\n\nAlice: Hi\n\nBob: Hey");
        assert_eq!(parsed.output, vec![Turn::new("Alice", "Hi"), Turn::new("Bob", "Hey")]);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].index, 0);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::MissingSpeaker);
        assert_eq!(parsed.diagnostics[0].excerpt, "just some text");
    }

    #[test]
    fn test_word_colon_after_blank_line_starts_a_block() {
        let parsed = parse_turns("Alice: my list\n\nNote: buy milk");
        assert_eq!(parsed.output.len(), 2);
        assert_eq!(parsed.output[1].speaker, "Note");
    }
}
