use plato_serializer_core::{
    cmj_to_text, decode, encode, html_to_cmj, html_to_text, text_to_cmj, text_to_html,
    DialogueConfig, Role,
};
use proptest::prelude::*;

fn speaker() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,10}"
}

/// Canonical utterance content: words joined by a space, a line break or a
/// `\n\t` continuation.
fn content() -> impl Strategy<Value = String> {
    let word = "[A-Za-z0-9&<>\"'.,!?;()]{1,8}";
    let separator = prop_oneof![Just(" "), Just("\n"), Just("\n\t")];
    (word, prop::collection::vec((separator, word), 0..6)).prop_map(|(first, rest)| {
        let mut text = first;
        for (sep, word) in rest {
            text.push_str(sep);
            text.push_str(&word);
        }
        text
    })
}

fn plato_text() -> impl Strategy<Value = String> {
    prop::collection::vec((speaker(), content()), 0..6).prop_map(|turns| {
        turns
            .into_iter()
            .map(|(speaker, content)| format!("{speaker}: {content}\n\n"))
            .collect()
    })
}

proptest! {
    #[test]
    fn html_round_trip_preserves_text(text in plato_text()) {
        let html = text_to_html(&text);
        prop_assert!(html.is_clean());
        prop_assert_eq!(html_to_text(&html.output).output, text);
    }

    #[test]
    fn cmj_round_trip_preserves_text(text in plato_text()) {
        let messages = text_to_cmj(&text, &DialogueConfig::default()).output;
        prop_assert_eq!(cmj_to_text(&messages), text);
    }

    #[test]
    fn both_surfaces_project_to_the_same_cmj(text in plato_text(), assistant in speaker()) {
        let config = DialogueConfig::with_assistant_name(assistant);
        let html = text_to_html(&text).output;
        prop_assert_eq!(html_to_cmj(&html, &config).output, text_to_cmj(&text, &config).output);
    }

    #[test]
    fn special_characters_survive_encoding(text in "[A-Za-z0-9 &<>\"'.,;:!?-]*") {
        prop_assert_eq!(decode(&encode(&text)), text);
    }
}

#[test]
fn end_to_end_through_cmj() {
    let config = DialogueConfig::with_assistant_name("Atlas");
    let text = "Alice: Hello there\n\nAtlas: Hi!\n\n";

    let messages = text_to_cmj(text, &config).output;
    let summary: Vec<(Role, &str, &str)> = messages
        .iter()
        .map(|m| (m.role, m.name.as_str(), m.content.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![(Role::User, "Alice", "Hello there"), (Role::Assistant, "Atlas", "Hi!")]
    );
    assert_eq!(cmj_to_text(&messages), text);
}

#[test]
fn changing_the_assistant_name_changes_roles() {
    let text = "Alice: Hi\n\nAtlas: Hello";
    let as_atlas = text_to_cmj(text, &DialogueConfig::with_assistant_name("atlas")).output;
    let as_alice = text_to_cmj(text, &DialogueConfig::with_assistant_name("ALICE")).output;
    assert_eq!(as_atlas[1].role, Role::Assistant);
    assert_eq!(as_alice[0].role, Role::Assistant);
    assert_eq!(as_alice[1].role, Role::User);
}
