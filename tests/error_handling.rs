mod common;

use common::{TranscriptBuilder, read, run_cli};
use std::fs;

#[test]
fn malformed_line_names_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    TranscriptBuilder::new("s1")
        .user("hello")
        .raw("{ not json")
        .assistant_text("never read")
        .write(&dir.path().join("bad.jsonl"));

    let (code, stdout, stderr) = run_cli(dir.path(), ["bad.jsonl"]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("claudebook: "), "stderr: {stderr}");
    assert!(stderr.contains("bad.jsonl:2"), "stderr: {stderr}");
    assert!(!dir.path().join("book").exists());
}

#[test]
fn blank_lines_and_unknown_records_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    TranscriptBuilder::new("s1")
        .raw("")
        .raw(r#"{"type":"queue-operation","operation":"enqueue"}"#)
        .user("hello")
        .raw("   ")
        .assistant_text("hi")
        .write(&dir.path().join("s.jsonl"));

    let (code, _, stderr) = run_cli(dir.path(), ["s.jsonl"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(dir.path().join("book/src/turn_1_text_2.md").exists());
}

#[test]
fn transcript_without_turns_fails() {
    let dir = tempfile::tempdir().unwrap();
    TranscriptBuilder::new("s1")
        .summary("only a summary")
        .tool_result("toolu_x", "orphan output")
        .write(&dir.path().join("empty.jsonl"));

    let (code, _, stderr) = run_cli(dir.path(), ["empty.jsonl"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("no conversation turns found"), "stderr: {stderr}");
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), ["nowhere.jsonl"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("nowhere.jsonl"), "stderr: {stderr}");
}

#[test]
fn inputs_are_required() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), Vec::<&str>::new());
    assert_ne!(code, 0);
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    TranscriptBuilder::new("s1")
        .user("hello")
        .write(&dir.path().join("s.jsonl"));
    let (code, _, stderr) = run_cli(dir.path(), ["s.jsonl", "--config", "gone.toml"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("gone.toml"), "stderr: {stderr}");
}

#[test]
fn broken_template_fails_with_its_name() {
    let dir = tempfile::tempdir().unwrap();
    TranscriptBuilder::new("s1")
        .user("hello")
        .write(&dir.path().join("s.jsonl"));
    fs::write(
        dir.path().join("claudebook.toml"),
        "[templates.index]\ninline = \"{% for %}\"\n",
    )
    .unwrap();
    let (code, _, stderr) = run_cli(dir.path(), ["s.jsonl"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("index.md"), "stderr: {stderr}");
}

#[test]
fn init_config_writes_defaults_once() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), ["--init-config"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("wrote "));

    let config = read(&dir.path().join("claudebook.toml"));
    assert!(config.contains("language = \"en\""));
    assert!(config.contains("max_result_chars = 4000"));

    let (code, stdout, _) = run_cli(dir.path(), ["--init-config"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("already exists"));
}
