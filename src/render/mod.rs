//! Turn partitioned pages into the files of an mdBook project.
//!
//! Rendering is pure: it produces `BookFile`s and never touches the disk.
//! `book::write_book` does the I/O.

mod markdown;
mod tool_input;

use crate::error::RenderError;
use crate::metadata::SessionMetadata;
use crate::pages::{Page, PagedTurn, ToolInteraction};
use crate::tools::ToolIndex;
use crate::transcript::{ContentBlock, ConversationEntry, MessageContent, ToolResultBlock};
use markdown::{code, fence, format_timestamp, language_for, table_cell, truncate};
use minijinja::Environment;
use serde::Serialize;
use std::path::PathBuf;
use tool_input::render_input;

/// Directory (inside the book) holding the Markdown sources.
pub const SRC_DIR: &str = "src";
const INTRO_FILE: &str = "index.md";

// ===================================================================
// Templates
// ===================================================================

const USER_TEMPLATE: &str = r#"# Turn {{ turn_index }}: {{ title }}

{% if timestamp %}
*{{ timestamp }}*

{% endif %}
## User

{{ body }}
"#;

const TEXT_TEMPLATE: &str = r#"# Turn {{ turn_index }}: Response

{% if meta %}
*{{ meta }}*

{% endif %}
{% for thought in thinking %}
<details>
<summary>Thinking</summary>

{{ thought }}

</details>

{% endfor %}
{{ body }}

{% for call in calls %}
### {{ call.name }}

{{ call.input }}

{% endfor %}
"#;

const TOOL_TEMPLATE: &str = r#"# Turn {{ turn_index }}: Tool Interactions

{% for interaction in interactions %}
{% if interaction.meta %}
*{{ interaction.meta }}*

{% endif %}
{% for thought in interaction.thinking %}
<details>
<summary>Thinking</summary>

{{ thought }}

</details>

{% endfor %}
{% for text in interaction.narration %}
{{ text }}

{% endfor %}
{% for call in interaction.calls %}
### {{ call.name }}

{{ call.input }}

{% endfor %}
{% for result in interaction.results %}
#### {{ result.heading }}

{{ result.body }}

{% endfor %}
{% if not loop.last %}
---

{% endif %}
{% endfor %}
"#;

const SUMMARY_TEMPLATE: &str = r#"# Summary

[Introduction]({{ intro }})

{% for turn in turns %}
- [Turn {{ turn.index }}: {{ turn.title }}]({{ turn.file }})
{% for page in turn.pages %}
  - [{{ page.label }}]({{ page.file }})
{% endfor %}
{% endfor %}
"#;

const INDEX_TEMPLATE: &str = r#"# {{ title }}

{% if rows %}
| | |
|---|---|
{% for row in rows %}
| {{ row.label }} | {{ row.value }} |
{% endfor %}

{% endif %}
{% if summaries %}
## Summaries

{% for summary in summaries %}
- {{ summary }}
{% endfor %}

{% endif %}
{% if tools %}
## Tool usage

| Tool | Calls |
|---|---:|
{% for tool in tools %}
| {{ tool.name }} | {{ tool.count }} |
{% endfor %}

{% endif %}
## Turns

{% for turn in turns %}
{{ turn.index }}. [{{ turn.title }}]({{ turn.file }})
{% endfor %}
"#;

/// Template sources, one per generated file kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Templates {
    pub user: String,
    pub text: String,
    pub tool: String,
    pub summary: String,
    pub index: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            user: USER_TEMPLATE.into(),
            text: TEXT_TEMPLATE.into(),
            tool: TOOL_TEMPLATE.into(),
            summary: SUMMARY_TEMPLATE.into(),
            index: INDEX_TEMPLATE.into(),
        }
    }
}

impl Templates {
    fn named(&self) -> [(&'static str, &str); 5] {
        [
            ("user.md", self.user.as_str()),
            ("text.md", self.text.as_str()),
            ("tool.md", self.tool.as_str()),
            ("SUMMARY.md", self.summary.as_str()),
            ("index.md", self.index.as_str()),
        ]
    }
}

fn environment(templates: &Templates) -> Result<Environment<'_>, RenderError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    for (name, source) in templates.named() {
        env.add_template(name, source)
            .map_err(|source| RenderError::Template {
                name: name.to_string(),
                source,
            })?;
    }
    Ok(env)
}

fn render<S: Serialize>(env: &Environment<'_>, name: &str, ctx: S) -> Result<String, RenderError> {
    let wrap = |source| RenderError::Template {
        name: name.to_string(),
        source,
    };
    let rendered = env.get_template(name).map_err(wrap)?.render(ctx).map_err(wrap)?;
    Ok(format!("{}\n", rendered.trim_end()))
}

// ===================================================================
// Inputs and outputs
// ===================================================================

/// Everything the renderer reads from the core.
pub struct BookInput<'a> {
    pub turns: &'a [PagedTurn<'a>],
    pub index: &'a ToolIndex<'a>,
    pub metadata: &'a SessionMetadata,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub max_result_chars: usize,
    pub max_input_chars: usize,
    pub include_thinking: bool,
    pub templates: Templates,
}

/// A generated file, relative to the book root.
#[derive(Debug, Clone, PartialEq)]
pub struct BookFile {
    pub path: PathBuf,
    pub contents: String,
}

impl BookFile {
    fn source(name: &str, contents: String) -> Self {
        Self {
            path: PathBuf::from(SRC_DIR).join(name),
            contents,
        }
    }
}

// ===================================================================
// Page views
// ===================================================================

#[derive(Serialize)]
struct CallView {
    name: String,
    input: String,
}

#[derive(Serialize)]
struct ResultView {
    heading: String,
    body: String,
}

#[derive(Serialize)]
struct InteractionView {
    meta: Option<String>,
    thinking: Vec<String>,
    narration: Vec<String>,
    calls: Vec<CallView>,
    results: Vec<ResultView>,
}

#[derive(Serialize)]
struct UserPageView<'a> {
    turn_index: usize,
    page_index: usize,
    title: &'a str,
    timestamp: Option<String>,
    body: String,
}

#[derive(Serialize)]
struct TextPageView<'a> {
    turn_index: usize,
    page_index: usize,
    title: &'a str,
    meta: Option<String>,
    thinking: Vec<String>,
    body: String,
    calls: Vec<CallView>,
}

#[derive(Serialize)]
struct ToolPageView<'a> {
    turn_index: usize,
    page_index: usize,
    title: &'a str,
    interactions: Vec<InteractionView>,
}

/// Model and time of an entry as one line, e.g. "`claude-x` · 2025-01-01 …".
fn entry_meta(entry: &ConversationEntry) -> Option<String> {
    let parts: Vec<String> = [
        entry.message.model.as_deref().map(code),
        entry.timestamp.as_deref().map(format_timestamp),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(" · "))
}

fn thinking(entry: &ConversationEntry, options: &RenderOptions) -> Vec<String> {
    if !options.include_thinking {
        return Vec::new();
    }
    entry
        .blocks()
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Thinking(t) if !t.thinking.trim().is_empty() => {
                Some(t.thinking.trim().to_string())
            }
            _ => None,
        })
        .collect()
}

fn calls(entry: &ConversationEntry, options: &RenderOptions) -> Vec<CallView> {
    entry
        .tool_uses()
        .map(|tu| CallView {
            name: tu.name.clone(),
            input: render_input(&tu.name, &tu.input, options.max_input_chars),
        })
        .collect()
}

fn result_view(result: &ToolResultBlock, index: &ToolIndex<'_>, options: &RenderOptions) -> ResultView {
    let id = result.tool_use_id.as_str();
    let name = index.tool_name(id);
    let path = if name == "Read" { index.file_path(id) } else { None };

    let mut heading = if result.is_error() {
        format!("Error: {name}")
    } else {
        format!("Result: {name}")
    };
    if let Some(path) = path {
        heading = format!("{heading} {}", code(path));
    }

    let text = result.text();
    let body = if text.trim().is_empty() {
        "*(no output)*".to_string()
    } else {
        let lang = path.map_or("text", language_for);
        fence(&truncate(&text, options.max_result_chars), lang)
    };
    ResultView { heading, body }
}

fn interaction_view(
    interaction: &ToolInteraction<'_>,
    index: &ToolIndex<'_>,
    options: &RenderOptions,
) -> InteractionView {
    let invocation = interaction.invocation;
    let narration = match &invocation.message.content {
        MessageContent::Text(t) if !t.trim().is_empty() => vec![t.trim().to_string()],
        MessageContent::Text(_) => Vec::new(),
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text(t) if !t.text.trim().is_empty() => Some(t.text.trim().to_string()),
                _ => None,
            })
            .collect(),
    };
    InteractionView {
        meta: entry_meta(invocation),
        thinking: thinking(invocation, options),
        narration,
        calls: calls(invocation, options),
        results: interaction
            .results
            .iter()
            .map(|r| result_view(r, index, options))
            .collect(),
    }
}

fn render_page(
    env: &Environment<'_>,
    page: &Page<'_>,
    title: &str,
    index: &ToolIndex<'_>,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let turn_index = page.turn_index();
    let page_index = page.page_index();
    match page {
        Page::User { user, .. } => render(
            env,
            "user.md",
            UserPageView {
                turn_index,
                page_index,
                title,
                timestamp: user.timestamp.as_deref().map(format_timestamp),
                body: user.full_text().trim().to_string(),
            },
        ),
        Page::Text { assistant, .. } => render(
            env,
            "text.md",
            TextPageView {
                turn_index,
                page_index,
                title,
                meta: entry_meta(assistant),
                thinking: thinking(assistant, options),
                body: assistant.full_text(),
                calls: calls(assistant, options),
            },
        ),
        Page::Tool { interactions, .. } => render(
            env,
            "tool.md",
            ToolPageView {
                turn_index,
                page_index,
                title,
                interactions: interactions
                    .iter()
                    .map(|i| interaction_view(i, index, options))
                    .collect(),
            },
        ),
    }
}

// ===================================================================
// Table of contents, introduction, book.toml
// ===================================================================

#[derive(Serialize)]
struct TocPage {
    label: &'static str,
    file: String,
}

#[derive(Serialize)]
struct TocTurn<'a> {
    index: usize,
    title: &'a str,
    file: String,
    pages: Vec<TocPage>,
}

fn page_label(page: &Page<'_>) -> &'static str {
    match page {
        Page::User { .. } => "Prompt",
        Page::Text { .. } => "Response",
        Page::Tool { .. } => "Tool Interactions",
    }
}

fn toc<'a>(turns: &'a [PagedTurn<'_>]) -> Vec<TocTurn<'a>> {
    turns
        .iter()
        .filter_map(|turn| {
            let (first, rest) = turn.pages.split_first()?;
            Some(TocTurn {
                index: turn.turn_index,
                title: &turn.title,
                file: first.filename(),
                pages: rest
                    .iter()
                    .map(|p| TocPage {
                        label: page_label(p),
                        file: p.filename(),
                    })
                    .collect(),
            })
        })
        .collect()
}

#[derive(Serialize)]
struct Row {
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct ToolCount<'a> {
    name: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct IndexView<'a> {
    title: &'a str,
    rows: Vec<Row>,
    summaries: &'a [String],
    tools: Vec<ToolCount<'a>>,
    turns: Vec<TocTurn<'a>>,
}

fn metadata_rows(input: &BookInput<'_>) -> Vec<Row> {
    let meta = input.metadata;
    let mut rows = Vec::new();
    let mut push = |label, value: Option<String>| {
        if let Some(value) = value {
            rows.push(Row {
                label,
                value: table_cell(&value),
            });
        }
    };
    push("Session", meta.session_id.as_deref().map(code));
    push("Started", meta.started_at.as_deref().map(format_timestamp));
    push("Ended", meta.ended_at.as_deref().map(format_timestamp));
    push("Directory", meta.cwd.as_deref().map(code));
    push("Branch", meta.git_branch.as_deref().map(code));
    push("Claude Code", meta.version.clone());
    push(
        "Models",
        (!meta.models.is_empty()).then(|| {
            meta.models
                .iter()
                .map(|m| code(m.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        }),
    );
    push("Turns", Some(input.turns.len().to_string()));
    push(
        "Pages",
        Some(input.turns.iter().map(|t| t.pages.len()).sum::<usize>().to_string()),
    );
    rows
}

#[derive(Serialize)]
struct BookToml<'a> {
    book: BookSection<'a>,
    output: OutputSection,
}

#[derive(Serialize)]
struct BookSection<'a> {
    title: &'a str,
    authors: &'a [String],
    language: &'a str,
    src: &'a str,
}

#[derive(Serialize)]
struct OutputSection {
    html: HtmlSection,
}

#[derive(Serialize)]
struct HtmlSection {
    #[serde(rename = "no-section-label")]
    no_section_label: bool,
    fold: FoldSection,
}

#[derive(Serialize)]
struct FoldSection {
    enable: bool,
    level: u8,
}

fn book_toml(options: &RenderOptions) -> Result<String, RenderError> {
    let config = BookToml {
        book: BookSection {
            title: &options.title,
            authors: &options.authors,
            language: &options.language,
            src: SRC_DIR,
        },
        output: OutputSection {
            html: HtmlSection {
                no_section_label: true,
                fold: FoldSection {
                    enable: true,
                    level: 0,
                },
            },
        },
    };
    Ok(toml::to_string_pretty(&config)?)
}

// ===================================================================
// Entry point
// ===================================================================

/// Render the whole book: `book.toml`, `SUMMARY.md`, the introduction and
/// one file per page, in that order.
pub fn render_book(input: &BookInput<'_>, options: &RenderOptions) -> Result<Vec<BookFile>, RenderError> {
    let env = environment(&options.templates)?;
    let mut files = vec![BookFile {
        path: PathBuf::from("book.toml"),
        contents: book_toml(options)?,
    }];

    files.push(BookFile::source(
        "SUMMARY.md",
        render(
            &env,
            "SUMMARY.md",
            minijinja::context! { intro => INTRO_FILE, turns => toc(input.turns) },
        )?,
    ));

    let index_view = IndexView {
        title: &options.title,
        rows: metadata_rows(input),
        summaries: &input.metadata.summaries,
        tools: input
            .index
            .usage()
            .into_iter()
            .map(|(name, count)| ToolCount { name, count })
            .collect(),
        turns: toc(input.turns),
    };
    files.push(BookFile::source(INTRO_FILE, render(&env, "index.md", index_view)?));

    for turn in input.turns {
        for page in &turn.pages {
            let contents = render_page(&env, page, &turn.title, input.index, options)?;
            files.push(BookFile::source(&page.filename(), contents));
        }
    }
    tracing::debug!(files = files.len(), "rendered book");
    Ok(files)
}
