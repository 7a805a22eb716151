//! Node.js bindings for the plato dialogue serializer.
//!
//! The display layer runs in JavaScript; these bindings give it the same
//! converters the CLI uses. Every function is stateless. Conversions that can
//! drop items return the dropped items' diagnostics alongside the output.

use napi::bindgen_prelude::*;
use napi_derive::napi;

use plato_serializer_core::{
    self as plato, AssistantReply, CmjMessage as CoreMessage, Conversion, Diagnostic as CoreDiagnostic,
    DialogueConfig, DisplayState, MachineConfig, Role,
};

/// A message in CMJ form.
#[napi(object)]
pub struct CmjMessage {
    /// One of "user", "assistant" or "system".
    pub role: String,
    pub name: String,
    pub content: String,
}

impl From<CoreMessage> for CmjMessage {
    fn from(msg: CoreMessage) -> Self {
        Self {
            role: msg.role.to_string(),
            name: msg.name,
            content: msg.content,
        }
    }
}

impl TryFrom<CmjMessage> for CoreMessage {
    type Error = Error;

    fn try_from(msg: CmjMessage) -> Result<Self> {
        let role: Role = msg.role.parse().map_err(to_napi_error)?;
        Ok(CoreMessage::new(role, msg.name, msg.content))
    }
}

/// An item dropped during a conversion.
#[napi(object)]
pub struct Diagnostic {
    pub index: u32,
    pub kind: String,
    pub message: String,
    pub excerpt: String,
}

impl From<CoreDiagnostic> for Diagnostic {
    fn from(diagnostic: CoreDiagnostic) -> Self {
        Self {
            index: u32::try_from(diagnostic.index).unwrap_or(u32::MAX),
            kind: format!("{:?}", diagnostic.kind),
            message: diagnostic.kind.to_string(),
            excerpt: diagnostic.excerpt,
        }
    }
}

/// A converted string plus what was dropped on the way.
#[napi(object)]
pub struct TextConversion {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Conversion<String>> for TextConversion {
    fn from(converted: Conversion<String>) -> Self {
        Self {
            output: converted.output,
            diagnostics: converted.diagnostics.into_iter().map(Into::into).collect(),
        }
    }
}

/// Converted CMJ messages plus what was dropped on the way.
#[napi(object)]
pub struct MessageConversion {
    pub messages: Vec<CmjMessage>,
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Conversion<Vec<CoreMessage>>> for MessageConversion {
    fn from(converted: Conversion<Vec<CoreMessage>>) -> Self {
        Self {
            messages: converted.output.into_iter().map(Into::into).collect(),
            diagnostics: converted.diagnostics.into_iter().map(Into::into).collect(),
        }
    }
}

/// What the display layer should show.
#[napi(object)]
pub struct DisplayView {
    /// "empty", "dialogue" or "error".
    pub state: String,
    pub markup: Option<String>,
}

/// Result of folding a model reply into the dialogue.
#[napi(object)]
pub struct ReplyOutcome {
    /// New PlatoText to persist; absent when the store should not change.
    pub plato_text: Option<String>,
    pub thoughts: Option<String>,
}

fn to_napi_error(err: plato::DialogueError) -> Error {
    Error::new(Status::InvalidArg, err.to_string())
}

fn dialogue_config(assistant_name: Option<String>) -> DialogueConfig {
    DialogueConfig { assistant_name }
}

/// Render PlatoText as PlatoHtml.
#[napi]
pub fn plato_text_to_plato_html(plato_text: String) -> TextConversion {
    plato::text_to_html(&plato_text).into()
}

/// Parse PlatoHtml back into PlatoText.
#[napi]
pub fn plato_html_to_plato_text(plato_html: String) -> TextConversion {
    plato::html_to_text(&plato_html).into()
}

/// Project PlatoText onto CMJ messages.
///
/// @param assistantName - Speaker treated as the assistant, if any.
#[napi]
pub fn plato_text_to_cmj(plato_text: String, assistant_name: Option<String>) -> MessageConversion {
    plato::text_to_cmj(&plato_text, &dialogue_config(assistant_name)).into()
}

/// Project PlatoHtml onto CMJ messages.
///
/// @param assistantName - Speaker treated as the assistant, if any.
#[napi]
pub fn plato_html_to_cmj(plato_html: String, assistant_name: Option<String>) -> MessageConversion {
    plato::html_to_cmj(&plato_html, &dialogue_config(assistant_name)).into()
}

/// Convert CMJ messages to PlatoText.
///
/// Accepts any JSON value; entries without string `name` and `content` are
/// skipped, and anything other than an array throws.
#[napi(js_name = "cmjToPlatoText")]
pub fn cmj_to_plato_text(messages: serde_json::Value) -> Result<TextConversion> {
    plato::cmj_value_to_text(&messages)
        .map(Into::into)
        .map_err(to_napi_error)
}

/// Classify a speaker as "user", "assistant" or "system".
#[napi]
pub fn infer_role(speaker: String, assistant_name: Option<String>) -> String {
    plato::infer_role(&speaker, assistant_name.as_deref()).to_string()
}

/// Escape text for PlatoHtml.
#[napi]
pub fn encode_entities(text: String) -> String {
    plato::encode(&text)
}

/// Decode a PlatoHtml fragment to text.
#[napi]
pub fn decode_entities(fragment: String) -> String {
    plato::decode(&fragment)
}

/// Decide what to show for the stored PlatoText.
#[napi]
pub fn display_state(stored: Option<String>) -> DisplayView {
    let state = plato::display_state(stored.as_deref());
    let markup = state.markup().map(str::to_string);
    let state = match state {
        DisplayState::Empty => "empty",
        DisplayState::Dialogue(_) => "dialogue",
        DisplayState::Error(_) => "error",
    };
    DisplayView {
        state: state.to_string(),
        markup,
    }
}

/// The PlatoText to start from when the page loads.
#[napi]
pub fn initial_plato_text(stored: Option<String>, static_html: String) -> String {
    plato::initial_plato_text(stored.as_deref(), &static_html)
}

/// Append a model reply to the dialogue that was sent.
///
/// @param messages - The CMJ messages that were sent to the model.
/// @param reply - The executor's reply, a message object or a list of response items.
/// @param machineName - Speaker name for the assistant's turn.
#[napi]
pub fn apply_assistant_reply(
    messages: Vec<CmjMessage>,
    reply: serde_json::Value,
    machine_name: String,
) -> Result<ReplyOutcome> {
    let messages = messages
        .into_iter()
        .map(CoreMessage::try_from)
        .collect::<Result<Vec<_>>>()?;
    let reply = AssistantReply::from_value(&reply).map_err(to_napi_error)?;
    let machine = MachineConfig {
        name: machine_name,
        work: String::new(),
    };

    let outcome = plato::apply_reply(messages, &reply, &machine);
    Ok(ReplyOutcome {
        plato_text: outcome.plato_text,
        thoughts: outcome.thoughts,
    })
}
