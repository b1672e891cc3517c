//! Small Markdown building blocks shared by the page renderers.

use crate::transcript::parse_timestamp;
use std::path::Path;

/// Truncate to `max` chars. A truncated string gets a note saying how much
/// was cut.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => {
            let omitted = s[byte_idx..].chars().count();
            format!("{}\n… ({omitted} more characters)", &s[..byte_idx])
        }
    }
}

/// Longest run of consecutive backticks in `s`.
fn longest_backtick_run(s: &str) -> usize {
    s.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// Wrap `content` in a fenced code block that cannot be closed early by
/// backticks inside the content.
pub fn fence(content: &str, lang: &str) -> String {
    let ticks = "`".repeat((longest_backtick_run(content) + 1).max(3));
    let body = content.trim_end_matches('\n');
    format!("{ticks}{lang}\n{body}\n{ticks}")
}

/// Inline code span, padded when the text itself holds backticks.
pub fn code(s: &str) -> String {
    let run = longest_backtick_run(s);
    if run == 0 {
        return format!("`{s}`");
    }
    let ticks = "`".repeat(run + 1);
    format!("{ticks} {s} {ticks}")
}

/// Prefix every line with `> `.
pub fn quote(s: &str) -> String {
    s.trim_end()
        .lines()
        .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Make text safe inside a table cell: pipes are escaped and line breaks
/// become spaces.
pub fn table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Code-fence language for a file path, by extension.
pub fn language_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("js" | "mjs" | "cjs") => "javascript",
        Some("ts" | "tsx") => "typescript",
        Some("go") => "go",
        Some("java") => "java",
        Some("c" | "h") => "c",
        Some("cc" | "cpp" | "hpp") => "cpp",
        Some("rb") => "ruby",
        Some("sh" | "bash") => "bash",
        Some("json") => "json",
        Some("toml") => "toml",
        Some("yaml" | "yml") => "yaml",
        Some("md") => "markdown",
        Some("html") => "html",
        Some("css") => "css",
        Some("sql") => "sql",
        _ => "text",
    }
}

/// Human-readable UTC timestamp, or the raw value if it does not parse.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => raw.to_string(),
    }
}
