#![allow(dead_code)]

use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Run the binary in `cwd`, returning (exit code, stdout, stderr).
pub fn run_cli<I, S>(cwd: &Path, args: I) -> (i32, String, String)
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(env!("CARGO_BIN_EXE_claudebook"))
        .current_dir(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run binary");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

/// Names of the generated page files in a book, sorted.
pub fn page_files(book: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(book.join("src"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("turn_"))
        .collect();
    names.sort();
    names
}

/// Builds a JSON-lines transcript with fresh uuids and increasing
/// timestamps.
pub struct TranscriptBuilder {
    session_id: String,
    clock: u32,
    lines: Vec<String>,
}

impl TranscriptBuilder {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            clock: 0,
            lines: Vec::new(),
        }
    }

    fn stamp(&mut self) -> String {
        self.clock += 1;
        format!(
            "2025-06-01T10:{:02}:{:02}.000Z",
            self.clock / 60,
            self.clock % 60
        )
    }

    fn push(mut self, role: &str, content: Value) -> Self {
        let timestamp = self.stamp();
        let record = json!({
            "type": role,
            "uuid": uuid::Uuid::new_v4().to_string(),
            "sessionId": self.session_id,
            "timestamp": timestamp,
            "cwd": "/work/project",
            "message": { "role": role, "content": content }
        });
        self.lines.push(record.to_string());
        self
    }

    pub fn user(self, text: &str) -> Self {
        self.push("user", json!(text))
    }

    pub fn assistant_text(self, text: &str) -> Self {
        self.push(
            "assistant",
            json!([{ "type": "text", "text": text }])
        )
    }

    pub fn tool_call(self, id: &str, name: &str, input: Value) -> Self {
        self.push(
            "assistant",
            json!([{ "type": "tool_use", "id": id, "name": name, "input": input }])
        )
    }

    pub fn tool_result(self, id: &str, content: &str) -> Self {
        self.push(
            "user",
            json!([{ "type": "tool_result", "tool_use_id": id, "content": content }])
        )
    }

    pub fn summary(mut self, text: &str) -> Self {
        self.lines
            .push(json!({ "type": "summary", "summary": text, "leafUuid": "leaf" }).to_string());
        self
    }

    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn write(&self, path: &Path) {
        write_lines(path, &self.lines);
    }
}

pub fn write_lines(path: &Path, lines: &[String]) {
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(path, contents).unwrap();
}
