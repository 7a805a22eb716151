//! Error and diagnostic types shared by every converter.
//!
//! Whole-input problems are reported as [`DialogueError`]. Problems with a
//! single block, paragraph or message inside an otherwise valid input are not
//! errors: the item is dropped and a [`Diagnostic`] is returned next to the
//! converted output in a [`Conversion`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DialogueError {
    /// The input did not have the shape the converter accepts.
    #[error("invalid input: expected {expected}, found {found}")]
    InvalidInputType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid CMJ document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The language-model reply carried no text to append.
    #[error("assistant reply is missing message content")]
    EmptyReply,

    #[error("unknown dialogue format '{0}'")]
    UnknownFormat(String),
}

impl DialogueError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why an item was dropped from a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A PlatoText block that does not start with `speaker:`.
    MissingSpeaker,
    /// A dialogue paragraph without a speaker element.
    MissingSpeakerElement,
    /// A CMJ entry without string `name` and `content` fields.
    MalformedMessage,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticKind::MissingSpeaker => "block does not start with a speaker pattern",
            DiagnosticKind::MissingSpeakerElement => "dialogue paragraph has no speaker element",
            DiagnosticKind::MalformedMessage => "message lacks a string name or content",
        };
        f.write_str(text)
    }
}

/// A dropped item: its position among the items of its kind and a short excerpt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub index: usize,
    pub kind: DiagnosticKind,
    pub excerpt: String,
}

impl Diagnostic {
    const EXCERPT_CHARS: usize = 60;

    pub(crate) fn new(index: usize, kind: DiagnosticKind, source: &str) -> Self {
        let mut excerpt: String = source.chars().take(Self::EXCERPT_CHARS).collect();
        if source.chars().nth(Self::EXCERPT_CHARS).is_some() {
            excerpt.push('…');
        }
        let diagnostic = Self {
            index,
            kind,
            excerpt,
        };
        log::warn!(target: "plato_serializer", "skipping item {}: {}: {:?}", index, kind, diagnostic.excerpt);
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}: {} ({:?})", self.index, self.kind, self.excerpt)
    }
}

/// The output of a converter together with everything it had to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion<T> {
    pub output: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Conversion<T> {
    pub fn new(output: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            output,
            diagnostics,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Conversion<U> {
        Conversion {
            output: f(self.output),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_output(self) -> T {
        self.output
    }
}

impl<T: Default> Default for Conversion<T> {
    fn default() -> Self {
        Self::new(T::default(), Vec::new())
    }
}
