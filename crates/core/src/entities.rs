//! Entity codec between plain utterance text and PlatoHtml fragments.

use crate::markup::{tokenize, Token, TokenKind};

/// Markup for the semantic tab that starts a continuation paragraph.
pub const EM_SPACE: &str = "&emsp;";

/// Markup for a semantic newline.
pub const LINE_BREAK: &str = "<br />";

const EM_SPACE_CHAR: char = '\u{2003}';

/// Escape `text` for PlatoHtml.
///
/// The replacements run in a fixed order with `&` first, so no escape
/// sequence produced here is escaped a second time.
pub fn encode(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
        .replace('\t', EM_SPACE)
        .replace('\n', LINE_BREAK)
}

/// Turn a PlatoHtml fragment back into utterance text.
///
/// Line breaks become `\n`. Em-space entities directly after a line break
/// (markup whitespace in between is ignored) become `\t`, restoring the
/// `\n\t` continuation marker. Every other entity becomes its character and
/// every other tag is dropped.
pub fn decode(fragment: &str) -> String {
    let tokens = tokenize(fragment);
    let mut out = String::with_capacity(fragment.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;
        if !token.is_line_break() {
            push_content(&mut out, token);
            continue;
        }

        out.push('\n');
        let mut j = i;
        while j < tokens.len() && tokens[j].is_blank_text() {
            j += 1;
        }
        if j < tokens.len() && tokens[j].is_entity(EM_SPACE_CHAR) {
            while j < tokens.len() && tokens[j].is_entity(EM_SPACE_CHAR) {
                out.push('\t');
                j += 1;
            }
            i = j;
        }
    }
    out
}

/// The text content of a fragment: text and entities only, tags dropped.
pub fn text_content(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for token in tokenize(fragment) {
        push_content(&mut out, &token);
    }
    out
}

fn push_content(out: &mut String, token: &Token<'_>) {
    match &token.kind {
        TokenKind::Text => out.push_str(token.raw),
        TokenKind::Entity(Some(text)) => out.push_str(text),
        // Unknown references stay as written, the way browsers show them.
        TokenKind::Entity(None) => out.push_str(token.raw),
        TokenKind::Open { .. } | TokenKind::Close { .. } | TokenKind::Comment => {}
    }
}
