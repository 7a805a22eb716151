//! Payloads exchanged with the external language-model process.
//!
//! Running the model is somebody else's job. This module builds the request
//! that goes out and folds the reply that comes back into the dialogue.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::conversation::{cmj_to_text, html_to_cmj, text_to_cmj, CmjMessage, DialogueConfig};
use crate::error::{Conversion, DialogueError};
use crate::role::Role;

/// Replies meaning the assistant chose not to speak.
pub const PASS_UTTERANCES: [&str; 3] = ["...", "silence", "pass"];

const FLOAT_SETTINGS: [&str; 4] = ["temperature", "frequency_penalty", "presence_penalty", "top_p"];
const INTEGER_SETTINGS: [&str; 1] = ["max_tokens"];

/// Identity of the automated participant and where its executor lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Speaker name the assistant's turns are written under.
    pub name: String,
    /// Location of the executor that runs the model.
    pub work: String,
}

impl MachineConfig {
    pub fn dialogue_config(&self) -> DialogueConfig {
        DialogueConfig::with_assistant_name(self.name.clone())
    }
}

/// Free-form sampling knobs passed through to the model.
///
/// Known numeric knobs are stored as numbers when their value parses; every
/// other value is kept as the string it came in as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmSettings(Map<String, Value>);

impl LlmSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from `key=value` pairs such as a page's query string.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut settings = Self::new();
        for (key, value) in pairs {
            settings.insert(key, value.as_ref());
        }
        settings
    }

    pub fn insert(&mut self, key: impl Into<String>, raw: &str) {
        let key = key.into();
        let value = coerce_setting(&key, raw);
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other`, replacing keys present in both.
    pub fn merge(&mut self, other: LlmSettings) {
        self.0.extend(other.0);
    }
}

fn coerce_setting(key: &str, raw: &str) -> Value {
    let number = if FLOAT_SETTINGS.contains(&key) {
        raw.trim().parse::<f64>().ok().and_then(Number::from_f64)
    } else if INTEGER_SETTINGS.contains(&key) {
        raw.trim().parse::<i64>().ok().map(Number::from)
    } else {
        None
    };
    number.map_or_else(|| Value::String(raw.to_string()), Value::Number)
}

/// The request handed to the model executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    pub config: MachineConfig,
    pub settings: LlmSettings,
    pub messages: Vec<CmjMessage>,
}

impl LlmRequest {
    /// Build a request from the displayed PlatoHtml.
    pub fn from_html(html: &str, machine: &MachineConfig, settings: &LlmSettings) -> Conversion<Self> {
        html_to_cmj(html, &machine.dialogue_config()).map(|messages| Self::new(machine, settings, messages))
    }

    /// Build a request from stored PlatoText.
    pub fn from_text(text: &str, machine: &MachineConfig, settings: &LlmSettings) -> Conversion<Self> {
        text_to_cmj(text, &machine.dialogue_config()).map(|messages| Self::new(machine, settings, messages))
    }

    fn new(machine: &MachineConfig, settings: &LlmSettings, messages: Vec<CmjMessage>) -> Self {
        Self {
            config: machine.clone(),
            settings: settings.clone(),
            messages,
        }
    }
}

/// What the model said, plus any reasoning summary it exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub thoughts: Option<String>,
}

impl AssistantReply {
    /// Read a reply in either shape the executor produces:
    ///
    /// * a single message object, `{"role": ..., "content": ...}`, whose
    ///   content is a string or a list of `{"text": ...}` parts;
    /// * a list of response items, where `"message"` items contribute their
    ///   content parts (joined with spaces) and `"reasoning"` items their
    ///   summary parts (joined with newlines) as thoughts.
    pub fn from_value(value: &Value) -> Result<Self, DialogueError> {
        let (text, thoughts) = match value {
            Value::Array(items) => (
                item_parts(items, "message", "content").join(" "),
                item_parts(items, "reasoning", "summary").join("\n"),
            ),
            Value::Object(message) => {
                let text = match message.get("content") {
                    Some(Value::String(text)) => text.clone(),
                    Some(Value::Array(parts)) => part_texts(parts).join(" "),
                    _ => String::new(),
                };
                (text, String::new())
            }
            _ => {
                return Err(DialogueError::InvalidInputType {
                    expected: "a message object or a list of response items",
                    found: "a scalar",
                })
            }
        };

        if text.trim().is_empty() && thoughts.trim().is_empty() {
            return Err(DialogueError::EmptyReply);
        }
        Ok(Self {
            text,
            thoughts: Some(thoughts).filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DialogueError> {
        Self::from_value(&serde_json::from_str(json)?)
    }

    /// True when the assistant declined to add a turn.
    pub fn is_pass(&self) -> bool {
        let text = self.text.trim().to_lowercase();
        text.is_empty() || PASS_UTTERANCES.contains(&text.as_str())
    }
}

fn item_parts<'a>(items: &'a [Value], kind: &str, field: &str) -> Vec<&'a str> {
    items
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some(kind))
        .filter_map(|item| item.get(field).and_then(Value::as_array))
        .flat_map(|parts| part_texts(parts))
        .collect()
}

fn part_texts(parts: &[Value]) -> Vec<&str> {
    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

/// Result of folding a reply into the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// New PlatoText to persist; `None` when the store should stay as it is.
    pub plato_text: Option<String>,
    pub thoughts: Option<String>,
}

/// Append the assistant's reply to the dialogue that was sent out.
///
/// The reply becomes an assistant turn named after the machine. Pass replies
/// leave the stored dialogue untouched.
pub fn apply_reply(
    mut messages: Vec<CmjMessage>,
    reply: &AssistantReply,
    machine: &MachineConfig,
) -> ExchangeOutcome {
    let plato_text = if reply.is_pass() {
        log::info!(target: "plato_serializer", "{} passed; dialogue unchanged", machine.name);
        None
    } else {
        messages.push(CmjMessage::new(Role::Assistant, machine.name.as_str(), reply.text.as_str()));
        Some(cmj_to_text(&messages))
    };

    ExchangeOutcome {
        plato_text,
        thoughts: reply.thoughts.clone(),
    }
}
