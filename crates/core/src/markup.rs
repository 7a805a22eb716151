//! Tokenizer for the markup vocabulary PlatoHtml actually uses.
//!
//! PlatoHtml only ever contains dialogue paragraphs, speaker spans, line
//! breaks and a handful of character entities, so instead of a general HTML
//! parser this module splits markup into flat tokens that keep their byte
//! offsets. Callers slice the input markup with those offsets, which is
//! how the utterance markup that follows a speaker element is recovered
//! verbatim.

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

/// Class carried by paragraphs that hold one dialogue turn.
pub const DIALOGUE_CLASS: &str = "dialogue";

/// Class carried by the element that holds the speaker identifier.
pub const SPEAKER_CLASS: &str = "speaker";

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(/?)([A-Za-z][A-Za-z0-9-]*)([^<>]*)>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^<!--.*?-->").unwrap());
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});").unwrap()
});
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind<'a> {
    Text,
    /// A character reference and what it stands for; `None` when the name
    /// is not an HTML entity.
    Entity(Option<String>),
    Open {
        name: String,
        attrs: &'a str,
    },
    Close {
        name: String,
    },
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub raw: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    pub fn opens(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::Open { name, .. } if name == tag)
    }

    pub fn closes(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::Close { name } if name == tag)
    }

    /// `<br>`, `<br/>`, `<br />` and the stray `</br>` browsers also honor.
    pub fn is_line_break(&self) -> bool {
        self.opens("br") || self.closes("br")
    }

    pub fn is_entity(&self, ch: char) -> bool {
        match &self.kind {
            TokenKind::Entity(Some(text)) => {
                let mut chars = text.chars();
                chars.next() == Some(ch) && chars.next().is_none()
            }
            _ => false,
        }
    }

    pub fn is_blank_text(&self) -> bool {
        self.kind == TokenKind::Text && self.raw.trim().is_empty()
    }

    pub fn has_class(&self, class: &str) -> bool {
        let TokenKind::Open { attrs, .. } = &self.kind else {
            return false;
        };
        CLASS_RE.captures_iter(attrs).any(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .is_some_and(|value| value.as_str().split_whitespace().any(|c| c == class))
        })
    }
}

/// Split `src` into text, entity, tag and comment tokens.
///
/// A `<` or `&` that does not start a well-formed tag, comment or entity is
/// left as literal text.
pub(crate) fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;
    // A comment opener past the last `-->` can never close.
    let last_comment_close = src.rfind("-->");

    while pos < src.len() {
        let rest = &src[pos..];
        let matched = match rest.as_bytes()[0] {
            b'<' => {
                let closable = last_comment_close.is_some_and(|close| close >= pos + 4);
                markup_token(rest, closable)
            }
            b'&' => entity_token(rest),
            _ => None,
        };

        match matched {
            Some((kind, len)) => {
                if text_start < pos {
                    tokens.push(text_token(src, text_start, pos));
                }
                tokens.push(Token {
                    kind,
                    raw: &src[pos..pos + len],
                    start: pos,
                    end: pos + len,
                });
                pos += len;
                text_start = pos;
            }
            None => {
                pos += rest
                    .char_indices()
                    .skip(1)
                    .find(|(_, c)| *c == '<' || *c == '&')
                    .map_or(rest.len(), |(i, _)| i);
            }
        }
    }

    if text_start < src.len() {
        tokens.push(text_token(src, text_start, src.len()));
    }
    tokens
}

fn text_token(src: &str, start: usize, end: usize) -> Token<'_> {
    Token {
        kind: TokenKind::Text,
        raw: &src[start..end],
        start,
        end,
    }
}

fn markup_token(rest: &str, comment_closable: bool) -> Option<(TokenKind<'_>, usize)> {
    if comment_closable {
        if let Some(m) = COMMENT_RE.find(rest) {
            return Some((TokenKind::Comment, m.end()));
        }
    }
    let caps = TAG_RE.captures(rest)?;
    let len = caps.get(0)?.end();
    let name = caps[2].to_ascii_lowercase();
    let kind = if caps[1].is_empty() {
        let attrs = caps.get(3).map_or("", |m| m.as_str());
        TokenKind::Open { name, attrs }
    } else {
        TokenKind::Close { name }
    };
    Some((kind, len))
}

fn entity_token<'a>(rest: &'a str) -> Option<(TokenKind<'a>, usize)> {
    let caps = ENTITY_RE.captures(rest)?;
    let len = caps.get(0)?.end();
    let decoded = decode_entity(&caps[1], caps.get(0)?.as_str());
    Some((TokenKind::Entity(decoded), len))
}

/// Numeric references are decoded here; named ones go through the full
/// HTML5 entity table.
fn decode_entity(body: &str, raw: &str) -> Option<String> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = decode_html_entities(raw);
    (decoded != raw).then(|| decoded.into_owned())
}

/// One `<p class="dialogue">` element, sliced out of the source markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParagraphScan<'a> {
    Dialogue {
        speaker_markup: &'a str,
        utterance_markup: &'a str,
    },
    /// The paragraph's whole inner markup; it has no speaker element.
    MissingSpeaker(&'a str),
}

/// Find every dialogue paragraph in document order.
///
/// A paragraph ends at its `</p>`, at the next `<p>` (which implicitly closes
/// it) or at the end of the input.
pub(crate) fn dialogue_paragraphs(src: &str) -> Vec<ParagraphScan<'_>> {
    let tokens = tokenize(src);
    let mut scans = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !(tokens[i].opens("p") && tokens[i].has_class(DIALOGUE_CLASS)) {
            i += 1;
            continue;
        }

        let body_start = tokens[i].end;
        let end = tokens[i + 1..]
            .iter()
            .position(|t| t.closes("p") || t.opens("p"))
            .map(|offset| i + 1 + offset);
        let (body_end, body, next) = match end {
            Some(j) if tokens[j].opens("p") => (tokens[j].start, &tokens[i + 1..j], j),
            Some(j) => (tokens[j].start, &tokens[i + 1..j], j + 1),
            None => (src.len(), &tokens[i + 1..], tokens.len()),
        };

        scans.push(scan_paragraph(src, body, body_start, body_end));
        i = next;
    }
    scans
}

fn scan_paragraph<'a>(
    src: &'a str,
    body: &[Token<'a>],
    body_start: usize,
    body_end: usize,
) -> ParagraphScan<'a> {
    let Some(open) = body
        .iter()
        .position(|t| t.opens("span") && t.has_class(SPEAKER_CLASS))
    else {
        return ParagraphScan::MissingSpeaker(&src[body_start..body_end]);
    };

    let mut depth = 0usize;
    let mut close = None;
    for (k, token) in body.iter().enumerate().skip(open + 1) {
        if token.opens("span") {
            depth += 1;
        } else if token.closes("span") {
            if depth == 0 {
                close = Some(k);
                break;
            }
            depth -= 1;
        }
    }

    let speaker_start = body[open].end;
    // An unclosed speaker span swallows the rest of the paragraph.
    let (speaker_end, utterance_start) = match close {
        Some(k) => (body[k].start, body[k].end),
        None => (body_end, body_end),
    };

    ParagraphScan::Dialogue {
        speaker_markup: &src[speaker_start..speaker_end],
        utterance_markup: &src[utterance_start..body_end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind<'_>> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_mixed_markup() {
        let tokens = tokenize("a &amp; b<br />c");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].raw, "a ");
        assert_eq!(tokens[1].kind, TokenKind::Entity(Some("&".to_string())));
        assert_eq!(tokens[2].raw, " b");
        assert!(tokens[3].is_line_break());
        assert_eq!(tokens[3].start, 9);
        assert_eq!(tokens[3].end, 15);
        assert_eq!(tokens[4].raw, "c");
    }

    #[test]
    fn test_stray_markup_characters_are_text() {
        assert_eq!(kinds("1 < 2 & 3"), vec![TokenKind::Text]);
        assert_eq!(kinds("&bogus;"), vec![TokenKind::Entity(None)]);
        assert_eq!(kinds("<!-- note -->x"), vec![TokenKind::Comment, TokenKind::Text]);
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(kinds("&#039;"), vec![TokenKind::Entity(Some("'".to_string()))]);
        assert_eq!(kinds("&#x2003;"), vec![TokenKind::Entity(Some("\u{2003}".to_string()))]);
        assert!(tokenize("&#x2003;")[0].is_entity('\u{2003}'));
    }

    #[test]
    fn test_named_entities_use_the_html5_table() {
        assert_eq!(kinds("&rsquo;"), vec![TokenKind::Entity(Some("\u{2019}".to_string()))]);
        assert_eq!(kinds("&hellip;"), vec![TokenKind::Entity(Some("\u{2026}".to_string()))]);
        assert_eq!(kinds("&copy;"), vec![TokenKind::Entity(Some("\u{a9}".to_string()))]);
        assert!(tokenize("&emsp;")[0].is_entity('\u{2003}'));
    }

    #[test]
    fn test_unterminated_comment_openers_are_text() {
        assert_eq!(kinds("a <!-- b <!-- c"), vec![TokenKind::Text]);
        assert_eq!(
            kinds("<!-- x <!-- y -->z"),
            vec![TokenKind::Comment, TokenKind::Text]
        );

        let many = "<!--".repeat(20_000);
        let tokens = tokenize(&many);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].raw.len(), many.len());
    }

    #[test]
    fn test_tag_names_are_case_insensitive() {
        let tokens = tokenize("<BR/></Span>");
        assert!(tokens[0].is_line_break());
        assert!(tokens[1].closes("span"));
    }

    #[test]
    fn test_class_matching() {
        let tokens = tokenize(r#"<p class="dialogue wide"><p class='dialogue-error'><p class=dialogue>"#);
        assert!(tokens[0].has_class(DIALOGUE_CLASS));
        assert!(!tokens[1].has_class(DIALOGUE_CLASS));
        assert!(tokens[2].has_class(DIALOGUE_CLASS));
    }

    #[test]
    fn test_dialogue_paragraphs() {
        let src = concat!(
            r#"<h1>Title</h1><p class="dialogue"><span class="speaker">Alice</span> Hi <b>there</b></p>"#,
            "\n",
            r#"<p class="intro">skip me</p><p class="dialogue">no speaker</p>"#,
        );
        let scans = dialogue_paragraphs(src);
        assert_eq!(
            scans,
            vec![
                ParagraphScan::Dialogue {
                    speaker_markup: "Alice",
                    utterance_markup: " Hi <b>there</b>",
                },
                ParagraphScan::MissingSpeaker("no speaker"),
            ]
        );
    }

    #[test]
    fn test_unclosed_paragraphs_end_at_next_paragraph() {
        let src = r#"<p class="dialogue"><span class="speaker">A</span> one<p class="dialogue"><span class="speaker">B</span> two"#;
        let scans = dialogue_paragraphs(src);
        assert_eq!(scans.len(), 2);
        assert_eq!(
            scans[1],
            ParagraphScan::Dialogue {
                speaker_markup: "B",
                utterance_markup: " two",
            }
        );
    }

    #[test]
    fn test_nested_span_inside_speaker() {
        let src = r#"<p class="dialogue"><span class="speaker"><span>Bo</span>b</span> hey</p>"#;
        assert_eq!(
            dialogue_paragraphs(src),
            vec![ParagraphScan::Dialogue {
                speaker_markup: "<span>Bo</span>b",
                utterance_markup: " hey",
            }]
        );
    }
}
