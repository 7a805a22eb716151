//! What the display layer shows for the stored dialogue.
//!
//! The canonical PlatoText lives in a store owned by the caller. These
//! functions only read it; a failed render never produces a value that could
//! be written back over it.

use crate::conversation::{html_to_text, text_to_html};

/// Markup shown in place of a dialogue that could not be rendered.
pub const DIALOGUE_ERROR_PLACEHOLDER: &str =
    "<p class='dialogue-error'>Error loading content. Please try editing or loading a new file.</p>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    /// Nothing stored yet; the caller offers to load a file.
    Empty,
    /// Rendered PlatoHtml.
    Dialogue(String),
    /// Stored text that renders to no turns at all.
    Error(String),
}

impl DisplayState {
    /// The markup to show, if any.
    pub fn markup(&self) -> Option<&str> {
        match self {
            DisplayState::Empty => None,
            DisplayState::Dialogue(html) | DisplayState::Error(html) => Some(html.as_str()),
        }
    }
}

/// Decide what to show for the stored PlatoText.
pub fn display_state(stored: Option<&str>) -> DisplayState {
    let Some(text) = stored.filter(|text| !text.trim().is_empty()) else {
        return DisplayState::Empty;
    };

    let rendered = text_to_html(text);
    if rendered.output.is_empty() {
        log::error!(
            target: "plato_serializer",
            "stored dialogue has no renderable turns ({} blocks dropped)",
            rendered.diagnostics.len()
        );
        return DisplayState::Error(DIALOGUE_ERROR_PLACEHOLDER.to_string());
    }
    DisplayState::Dialogue(rendered.output)
}

/// The PlatoText to start from.
///
/// An existing stored value always wins, even when empty. Otherwise the
/// dialogue paragraphs already present in the page markup seed the store.
pub fn initial_plato_text(stored: Option<&str>, static_html: &str) -> String {
    match stored {
        Some(text) => text.to_string(),
        None => html_to_text(static_html).output,
    }
}
