use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const DIALOGUE: &str = "Alice: Hello there\n\nAtlas: Hi!\n\n";

#[test]
fn convert_text_file_to_html() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("talk.plato");
    fs::write(&input, DIALOGUE).unwrap();

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.arg("convert").arg(&input).arg("--to").arg("html");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<p class="dialogue"><span class="speaker">Alice</span> Hello there</p>"#,
        ))
        .stdout(predicate::str::contains(
            r#"<p class="dialogue"><span class="speaker">Atlas</span> Hi!</p>"#,
        ));
}

#[test]
fn convert_reads_stdin_and_writes_output_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("talk.html");

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args(["convert", "-", "--from", "text", "--to", "html", "-o"])
        .arg(&output)
        .write_stdin(DIALOGUE);
    cmd.assert().success();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains(r#"<span class="speaker">Alice</span>"#));

    let mut back = cargo_bin_cmd!("plato-serialize");
    back.arg("convert").arg(&output).args(["--to", "text"]);
    back.assert().success().stdout(DIALOGUE);
}

#[test]
fn convert_to_cmj_uses_assistant_name() {
    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args(["--assistant-name", "atlas", "convert", "--from", "text", "--to", "cmj"])
        .write_stdin(DIALOGUE);

    let output = cmd.assert().success().get_output().stdout.clone();
    let messages: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        messages,
        serde_json::json!([
            {"role": "user", "name": "Alice", "content": "Hello there"},
            {"role": "assistant", "name": "Atlas", "content": "Hi!"}
        ])
    );
}

#[test]
fn convert_reads_assistant_name_from_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("plato.toml");
    fs::write(&config, "[machine]\nname = \"Alice\"\nwork = \"\"\n").unwrap();

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.arg("--config")
        .arg(&config)
        .args(["convert", "--from", "text", "--to", "cmj"])
        .write_stdin(DIALOGUE);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""role": "assistant",
    "name": "Alice""#));
}

#[test]
fn strict_convert_fails_on_dropped_blocks() {
    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args(["convert", "--from", "text", "--to", "html", "--strict"])
        .write_stdin("just some words\n\nAlice: hi");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("1 items were dropped"));
}

#[test]
fn convert_without_format_hint_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("talk.dat");
    fs::write(&input, DIALOGUE).unwrap();

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.arg("convert").arg(&input).args(["--to", "html"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("pass --from"));
}

#[test]
fn role_prints_each_speaker() {
    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args(["--assistant-name", "Atlas", "role", "atlas", "INSTRUCTIONS", "Bob"]);
    cmd.assert()
        .success()
        .stdout("atlas\tassistant\nINSTRUCTIONS\tsystem\nBob\tuser\n");
}

#[test]
fn batch_mirrors_the_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("in");
    let out = dir.path().join("out");
    fs::create_dir_all(root.join("nested")).unwrap();
    fs::write(root.join("one.plato"), DIALOGUE).unwrap();
    fs::write(root.join("nested/two.plato"), "Bob: yo\n\n").unwrap();

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.arg("batch")
        .arg("--root")
        .arg(&root)
        .arg("--output-dir")
        .arg(&out)
        .args(["--to", "html"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Converted: 2"));

    assert!(out.join("one.html").exists());
    let nested = fs::read_to_string(out.join("nested/two.html")).unwrap();
    assert!(nested.contains(r#"<span class="speaker">Bob</span> yo"#));
}

#[test]
fn request_builds_payload_with_settings() {
    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args([
        "--assistant-name",
        "Atlas",
        "request",
        "--from",
        "text",
        "--set",
        "temperature=0.5",
        "--set",
        "model=gpt-4o",
    ])
    .write_stdin(DIALOGUE);

    let output = cmd.assert().success().get_output().stdout.clone();
    let request: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(request["config"]["name"], "Atlas");
    assert_eq!(request["settings"]["temperature"], 0.5);
    assert_eq!(request["settings"]["model"], "gpt-4o");
    assert_eq!(request["messages"][1]["role"], "assistant");
}

#[test]
fn reply_appends_assistant_turn() {
    let dir = tempdir().unwrap();
    let dialogue = dir.path().join("talk.plato");
    fs::write(&dialogue, "Alice: Hello there\n\n").unwrap();

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args(["--assistant-name", "Atlas", "reply", "--dialogue"])
        .arg(&dialogue)
        .write_stdin(r#"{"role": "assistant", "content": "Hi!"}"#);
    cmd.assert().success().stdout(DIALOGUE);
}

#[test]
fn reply_pass_leaves_dialogue_unchanged() {
    let dir = tempdir().unwrap();
    let dialogue = dir.path().join("talk.plato");
    fs::write(&dialogue, "Alice: Hello there\n\n").unwrap();

    let mut cmd = cargo_bin_cmd!("plato-serialize");
    cmd.args(["--assistant-name", "Atlas", "reply", "--dialogue"])
        .arg(&dialogue)
        .write_stdin(r#"{"role": "assistant", "content": "pass"}"#);
    cmd.assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("dialogue unchanged"));
}
