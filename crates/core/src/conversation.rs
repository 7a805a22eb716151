//! Converters between the three dialogue representations.
//!
//! * PlatoText, the canonical storage format: `speaker: utterance` blocks
//!   separated by blank lines.
//! * PlatoHtml, the display markup: one `<p class="dialogue">` per turn.
//! * CMJ, the chat-message list sent to a language model.
//!
//! Every converter is a pure function of its input (and, where roles are
//! involved, an explicit [`DialogueConfig`]). Empty or whitespace-only input
//! always converts to empty output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{decode, encode, text_content};
use crate::error::{Conversion, Diagnostic, DiagnosticKind, DialogueError};
use crate::grammar::{parse_turns, Turn};
use crate::helpers::normalize_utterance;
use crate::markup::{dialogue_paragraphs, ParagraphScan, DIALOGUE_CLASS, SPEAKER_CLASS};
use crate::role::{infer_role, Role};

/// Configuration for role inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueConfig {
    /// Display name of the automated participant. `None` means no speaker is
    /// treated as the assistant.
    pub assistant_name: Option<String>,
}

impl DialogueConfig {
    pub fn with_assistant_name(name: impl Into<String>) -> Self {
        Self {
            assistant_name: Some(name.into()),
        }
    }

    pub fn assistant_name(&self) -> Option<&str> {
        self.assistant_name.as_deref()
    }

    pub fn role_of(&self, speaker: &str) -> Role {
        infer_role(speaker, self.assistant_name())
    }
}

/// A single message in CMJ form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmjMessage {
    pub role: Role,
    pub name: String,
    pub content: String,
}

impl CmjMessage {
    pub fn new(role: Role, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn from_turn(turn: Turn, config: &DialogueConfig) -> Self {
        Self {
            role: config.role_of(&turn.speaker),
            name: turn.speaker,
            content: turn.content,
        }
    }
}

/// Render PlatoText as PlatoHtml, one paragraph per line.
pub fn text_to_html(text: &str) -> Conversion<String> {
    parse_turns(text).map(|turns| {
        log::debug!(target: "plato_serializer", "rendering {} turns to PlatoHtml", turns.len());
        turns
            .iter()
            .map(render_paragraph)
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn render_paragraph(turn: &Turn) -> String {
    format!(
        r#"<p class="{DIALOGUE_CLASS}"><span class="{SPEAKER_CLASS}">{}</span> {}</p>"#,
        turn.speaker,
        encode(&turn.content)
    )
}

/// Extract the turns of a PlatoHtml document in document order.
///
/// Paragraphs without a speaker element are dropped and reported.
pub fn html_turns(html: &str) -> Conversion<Vec<Turn>> {
    let mut turns = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, scan) in dialogue_paragraphs(html).into_iter().enumerate() {
        match scan {
            ParagraphScan::Dialogue {
                speaker_markup,
                utterance_markup,
            } => {
                // The space the renderer puts after the speaker element is structural.
                let utterance = utterance_markup.strip_prefix(' ').unwrap_or(utterance_markup);
                turns.push(Turn::new(
                    text_content(speaker_markup).trim(),
                    normalize_utterance(&decode(utterance)),
                ));
            }
            ParagraphScan::MissingSpeaker(markup) => diagnostics.push(Diagnostic::new(
                index,
                DiagnosticKind::MissingSpeakerElement,
                markup,
            )),
        }
    }

    Conversion::new(turns, diagnostics)
}

/// Parse PlatoHtml back into PlatoText.
pub fn html_to_text(html: &str) -> Conversion<String> {
    html_turns(html).map(|turns| {
        turns
            .iter()
            .filter(|turn| !(turn.speaker.is_empty() && turn.content.is_empty()))
            .map(Turn::to_plato_text)
            .collect()
    })
}

/// Project PlatoText onto CMJ messages.
pub fn text_to_cmj(text: &str, config: &DialogueConfig) -> Conversion<Vec<CmjMessage>> {
    parse_turns(text).map(|turns| to_messages(turns, config))
}

/// Project PlatoHtml onto CMJ messages.
pub fn html_to_cmj(html: &str, config: &DialogueConfig) -> Conversion<Vec<CmjMessage>> {
    html_turns(html).map(|turns| to_messages(turns, config))
}

fn to_messages(turns: Vec<Turn>, config: &DialogueConfig) -> Vec<CmjMessage> {
    turns
        .into_iter()
        .map(|turn| CmjMessage::from_turn(turn, config))
        .collect()
}

/// Convert CMJ messages to PlatoText. The message roles are not consulted.
pub fn cmj_to_text(messages: &[CmjMessage]) -> String {
    messages
        .iter()
        .map(|message| plato_block(&message.name, &message.content))
        .collect()
}

fn plato_block(name: &str, content: &str) -> String {
    format!("{}: {}\n\n", name.trim(), normalize_utterance(content))
}

/// Convert an untyped CMJ document to PlatoText.
///
/// Entries without string `name` and `content` fields are skipped and
/// reported. Anything other than an array is rejected.
pub fn cmj_value_to_text(value: &Value) -> Result<Conversion<String>, DialogueError> {
    let Value::Array(entries) = value else {
        return Err(DialogueError::InvalidInputType {
            expected: "an array of CMJ messages",
            found: json_kind(value),
        });
    };

    let mut text = String::new();
    let mut diagnostics = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let name = entry.get("name").and_then(Value::as_str);
        let content = entry.get("content").and_then(Value::as_str);
        match (name, content) {
            (Some(name), Some(content)) => text.push_str(&plato_block(name, content)),
            _ => diagnostics.push(Diagnostic::new(
                index,
                DiagnosticKind::MalformedMessage,
                &entry.to_string(),
            )),
        }
    }

    Ok(Conversion::new(text, diagnostics))
}

/// Parse a CMJ JSON document and convert it to PlatoText.
pub fn cmj_json_to_text(json: &str) -> Result<Conversion<String>, DialogueError> {
    if json.trim().is_empty() {
        return Ok(Conversion::default());
    }
    let value: Value = serde_json::from_str(json)?;
    cmj_value_to_text(&value)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
