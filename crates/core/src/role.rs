//! Role inference for dialogue turns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DialogueError;
use crate::helpers::same_speaker;

/// Speaker whose turns are system instructions.
pub const INSTRUCTIONS_SPEAKER: &str = "INSTRUCTIONS";

/// Chat role of a turn, derived from its speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(DialogueError::InvalidInputType {
                expected: "one of user, assistant, system",
                found: "an unknown role",
            }),
        }
    }
}

/// Classify a speaker.
///
/// The assistant name wins over `INSTRUCTIONS`; blank names are ignored.
/// Both comparisons are case-insensitive.
pub fn infer_role(speaker: &str, assistant_name: Option<&str>) -> Role {
    let is_assistant = assistant_name
        .filter(|name| !name.trim().is_empty())
        .is_some_and(|name| same_speaker(speaker, name));

    if is_assistant {
        Role::Assistant
    } else if same_speaker(speaker, INSTRUCTIONS_SPEAKER) {
        Role::System
    } else {
        Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_name_matches_case_insensitively() {
        assert_eq!(infer_role("Atlas", Some("Atlas")), Role::Assistant);
        assert_eq!(infer_role("atlas", Some("ATLAS")), Role::Assistant);
    }

    #[test]
    fn test_instructions_is_system() {
        assert_eq!(infer_role("Instructions", Some("Atlas")), Role::System);
        assert_eq!(infer_role("INSTRUCTIONS", None), Role::System);
    }

    #[test]
    fn test_everyone_else_is_user() {
        assert_eq!(infer_role("Alice", Some("Atlas")), Role::User);
        assert_eq!(infer_role("Atlas", None), Role::User);
        assert_eq!(infer_role("Atlas", Some("  ")), Role::User);
    }

    #[test]
    fn test_assistant_named_instructions() {
        assert_eq!(infer_role("instructions", Some("Instructions")), Role::Assistant);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);
        assert!("robot".parse::<Role>().is_err());
    }
}
