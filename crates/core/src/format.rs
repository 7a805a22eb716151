//! Format names and conversion routing between any two representations.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::conversation::{
    cmj_json_to_text, html_to_cmj, html_to_text, text_to_cmj, text_to_html, DialogueConfig,
};
use crate::error::{Conversion, DialogueError};

/// The three dialogue representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// PlatoText, the canonical storage format.
    Text,
    /// PlatoHtml, the display markup.
    Html,
    /// CMJ, a JSON array of chat messages.
    Cmj,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Text, Format::Html, Format::Cmj];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Html => "html",
            Format::Cmj => "cmj",
        }
    }

    /// Extensions recognised for this format, without the leading dot.
    /// The first one is used when writing files.
    pub fn file_extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Text => &["plato", "txt", "md", "text"],
            Format::Html => &["html", "htm"],
            Format::Cmj => &["json"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|format| format.file_extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Format> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plato" | "platotext" => Ok(Format::Text),
            "html" | "platohtml" => Ok(Format::Html),
            "cmj" | "json" => Ok(Format::Cmj),
            _ => Err(DialogueError::UnknownFormat(s.to_string())),
        }
    }
}

/// Convert `input` from one format to another.
///
/// CMJ output is pretty-printed JSON. Converting a format to itself returns
/// its canonical form.
pub fn convert(
    input: &str,
    from: Format,
    to: Format,
    config: &DialogueConfig,
) -> Result<Conversion<String>, DialogueError> {
    let converted = match (from, to) {
        (Format::Text, Format::Html) => text_to_html(input),
        (Format::Html, Format::Text) => html_to_text(input),
        (Format::Text, Format::Text) => text_to_html(input).map(|html| html_to_text(&html).output),
        (Format::Html, Format::Html) => {
            let text = html_to_text(input);
            text.map(|text| text_to_html(&text).output)
        }
        (Format::Text, Format::Cmj) => cmj_document(text_to_cmj(input, config))?,
        (Format::Html, Format::Cmj) => cmj_document(html_to_cmj(input, config))?,
        (Format::Cmj, target) => {
            let text = cmj_json_to_text(input)?;
            match target {
                Format::Text => text,
                Format::Html => text.map(|text| text_to_html(&text).output),
                Format::Cmj => {
                    let messages = text_to_cmj(&text.output, config).output;
                    cmj_document(Conversion::new(messages, text.diagnostics))?
                }
            }
        }
    };
    Ok(converted)
}

fn cmj_document<T: serde::Serialize>(
    converted: Conversion<T>,
) -> Result<Conversion<String>, DialogueError> {
    let json = serde_json::to_string_pretty(&converted.output)?;
    Ok(Conversion::new(json, converted.diagnostics))
}
