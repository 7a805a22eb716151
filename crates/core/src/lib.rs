//! Core conversion logic for plato dialogues.
//!
//! A dialogue is stored as PlatoText, shown as PlatoHtml and sent to a
//! language model as CMJ (a list of chat messages). This crate moves a
//! dialogue between the three without losing content:
//!
//! ```text
//! PlatoText  <->  PlatoHtml
//!     \              /
//!      +---> CMJ <--+      (CMJ -> PlatoText on the way back)
//! ```
//!
//! All converters are pure functions. Items they cannot use (a block without a
//! speaker, a message without content) are dropped and reported as
//! [`Diagnostic`]s alongside the result instead of failing the whole call.

mod conversation;
mod entities;
mod error;
mod exchange;
mod format;
mod grammar;
mod helpers;
mod markup;
pub mod pipeline;
mod role;
mod session;

pub use conversation::{
    cmj_json_to_text, cmj_to_text, cmj_value_to_text, html_to_cmj, html_to_text, html_turns,
    text_to_cmj, text_to_html, CmjMessage, DialogueConfig,
};
pub use entities::{decode, encode, text_content, EM_SPACE, LINE_BREAK};
pub use error::{Conversion, Diagnostic, DiagnosticKind, DialogueError};
pub use exchange::{
    apply_reply, AssistantReply, ExchangeOutcome, LlmRequest, LlmSettings, MachineConfig,
    PASS_UTTERANCES,
};
pub use format::{convert, Format};
pub use grammar::{parse_block, parse_turns, split_blocks, MalformedBlock, Turn};
pub use helpers::{clean_text, normalize_utterance, CONTINUATION};
pub use markup::{DIALOGUE_CLASS, SPEAKER_CLASS};
pub use pipeline::{
    convert_all, discover_dialogue_files, FileResult, PipelineConfig, PipelineResult,
};
pub use role::{infer_role, Role, INSTRUCTIONS_SPEAKER};
pub use session::{display_state, initial_plato_text, DisplayState, DIALOGUE_ERROR_PLACEHOLDER};
