//! Markdown for the input of a single tool call.

use super::markdown::{code, fence, language_for, quote, truncate};
use serde_json::Value;

/// Render a tool call's input for a page. Known tools get a tailored
/// layout; anything else (MCP tools included) is shown as JSON.
pub fn render_input(name: &str, input: &Value, max_chars: usize) -> String {
    let rendered = match name {
        "Bash" => bash(input),
        "Read" => read(input),
        "Write" => write(input, max_chars),
        "Edit" => edit(input, max_chars),
        "MultiEdit" => multi_edit(input, max_chars),
        "NotebookEdit" => notebook_edit(input, max_chars),
        "Grep" | "Glob" => search(input),
        "WebFetch" => web_fetch(input),
        "WebSearch" => input["query"].as_str().map(|q| format!("**Query:** {}", code(q))),
        "Task" => task(input),
        "TodoWrite" => todos(input),
        _ => None,
    };
    rendered.unwrap_or_else(|| raw(input, max_chars))
}

fn raw(input: &Value, max_chars: usize) -> String {
    match input {
        Value::Null => "*(no input)*".to_string(),
        Value::Object(map) if map.is_empty() => "*(no input)*".to_string(),
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            fence(&truncate(&pretty, max_chars), "json")
        }
    }
}

fn file_line(input: &Value, field: &str) -> Option<String> {
    input[field].as_str().map(|p| format!("**File:** {}", code(p)))
}

fn bash(input: &Value) -> Option<String> {
    let command = input["command"].as_str()?;
    let mut out = String::new();
    if let Some(desc) = input["description"].as_str() {
        out.push_str(&format!("*{}*\n\n", desc.trim()));
    }
    out.push_str(&fence(command, "bash"));
    Some(out)
}

fn read(input: &Value) -> Option<String> {
    let mut label = file_line(input, "file_path")?;
    if let Some(offset) = input["offset"].as_i64() {
        let limit = input["limit"].as_i64().unwrap_or(2000).max(1);
        let last = offset.saturating_add(limit - 1);
        label = format!("{label} (lines {offset}–{last})");
    } else if let Some(limit) = input["limit"].as_i64() {
        label = format!("{label} (first {limit} lines)");
    }
    Some(label)
}

fn write(input: &Value, max_chars: usize) -> Option<String> {
    let path = input["file_path"].as_str()?;
    let content = input["content"].as_str().unwrap_or_default();
    Some(format!(
        "**File:** {}\n\n{}",
        code(path),
        fence(&truncate(content, max_chars), language_for(path))
    ))
}

fn diff(old: &str, new: &str) -> String {
    let mut lines: Vec<String> = old.lines().map(|l| format!("-{l}")).collect();
    lines.extend(new.lines().map(|l| format!("+{l}")));
    lines.join("\n")
}

fn edit(input: &Value, max_chars: usize) -> Option<String> {
    let mut out = file_line(input, "file_path")?;
    if input["replace_all"].as_bool() == Some(true) {
        out.push_str(" (all occurrences)");
    }
    let old = input["old_string"].as_str().unwrap_or_default();
    let new = input["new_string"].as_str().unwrap_or_default();
    out.push_str("\n\n");
    out.push_str(&fence(&truncate(&diff(old, new), max_chars), "diff"));
    Some(out)
}

fn multi_edit(input: &Value, max_chars: usize) -> Option<String> {
    let mut out = file_line(input, "file_path")?;
    let hunks: Vec<String> = input["edits"]
        .as_array()
        .map(|edits| {
            edits
                .iter()
                .map(|e| {
                    diff(
                        e["old_string"].as_str().unwrap_or_default(),
                        e["new_string"].as_str().unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    out.push_str(&format!(" ({} edits)\n\n", hunks.len()));
    out.push_str(&fence(&truncate(&hunks.join("\n\n"), max_chars), "diff"));
    Some(out)
}

fn notebook_edit(input: &Value, max_chars: usize) -> Option<String> {
    let mut out = file_line(input, "notebook_path")?;
    if let Some(source) = input["new_source"].as_str() {
        out.push_str("\n\n");
        out.push_str(&fence(&truncate(source, max_chars), "python"));
    }
    Some(out)
}

fn search(input: &Value) -> Option<String> {
    let mut label = format!("**Pattern:** {}", code(input["pattern"].as_str()?));
    if let Some(path) = input["path"].as_str() {
        label = format!("{label} in {}", code(path));
    }
    if let Some(glob) = input["glob"].as_str() {
        label = format!("{label} ({})", code(glob));
    }
    Some(label)
}

fn web_fetch(input: &Value) -> Option<String> {
    let url = input["url"].as_str()?;
    let mut out = format!("**URL:** <{url}>");
    if let Some(prompt) = input["prompt"].as_str() {
        out.push_str("\n\n");
        out.push_str(&quote(prompt));
    }
    Some(out)
}

fn task(input: &Value) -> Option<String> {
    let description = input["description"].as_str()?;
    let mut out = format!("**Task:** {description}");
    if let Some(agent) = input["subagent_type"].as_str() {
        out.push_str(&format!(" ({})", code(agent)));
    }
    if let Some(prompt) = input["prompt"].as_str() {
        out.push_str("\n\n");
        out.push_str(&quote(prompt));
    }
    Some(out)
}

fn todos(input: &Value) -> Option<String> {
    let items = input["todos"].as_array()?;
    let lines: Vec<String> = items
        .iter()
        .map(|todo| {
            let content = todo["content"].as_str().unwrap_or("(untitled)");
            match todo["status"].as_str() {
                Some("completed") => format!("- [x] {content}"),
                Some("in_progress") => format!("- [ ] **{content}** (in progress)"),
                _ => format!("- [ ] {content}"),
            }
        })
        .collect();
    Some(lines.join("\n"))
}
