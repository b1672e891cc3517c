use crate::error::TranscriptError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

// ===================================================================
// Top-level transcript entry, one per JSONL line
// ===================================================================

/// A single line in a Claude Code `.jsonl` transcript file.
///
/// Discriminated by the `type` field (camelCase JSON throughout). Entry
/// kinds that play no part in conversational structure (progress, system,
/// queue operations) all land in `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TranscriptEntry {
    #[serde(rename = "user")]
    User(ConversationEntry),
    #[serde(rename = "assistant")]
    Assistant(ConversationEntry),
    #[serde(rename = "file-history-snapshot")]
    FileHistorySnapshot(FileHistorySnapshotEntry),
    #[serde(rename = "summary")]
    Summary(SummaryEntry),
    #[serde(other)]
    Other,
}

// ===================================================================
// Conversation entries (user + assistant share the same shape)
// ===================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    pub uuid: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub message: Message,

    // --- fields that only appear on some entries ---
    #[serde(default)]
    pub is_sidechain: bool,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

// ===================================================================
// Message
// ===================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: String,
    pub content: MessageContent,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// `message.content` can be a plain string (user text) or an array of
/// content blocks (assistant responses, tool results).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

// ===================================================================
// Content blocks inside message.content[]
// ===================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text(TextBlock),
    #[serde(rename = "thinking")]
    Thinking(ThinkingBlock),
    #[serde(rename = "tool_use")]
    ToolUse(ToolUseBlock),
    #[serde(rename = "tool_result")]
    ToolResult(ToolResultBlock),
    /// Images, redacted thinking and anything newer than this model.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBlock {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThinkingBlock {
    pub thinking: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    #[serde(default)]
    pub content: ToolResultContent,
    #[serde(default)]
    pub is_error: Option<bool>,
}

/// Tool output is either a bare string or a list of parts, most of which
/// are `{"type": "text", "text": ...}`. Anything else is kept raw.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Parts(Vec<ToolResultPart>),
    Raw(serde_json::Value),
}

impl Default for ToolResultContent {
    fn default() -> Self {
        ToolResultContent::Text(String::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolResultPart {
    #[serde(default, rename = "type")]
    pub part_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ToolResultBlock {
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Flatten the result content into plain text. Non-text parts are
    /// rendered as `[<type>]` placeholders.
    pub fn text(&self) -> String {
        match &self.content {
            ToolResultContent::Text(t) => t.clone(),
            ToolResultContent::Parts(parts) => parts
                .iter()
                .map(|p| match (&p.text, &p.part_type) {
                    (Some(t), _) => t.clone(),
                    (None, Some(kind)) => format!("[{kind}]"),
                    (None, None) => String::new(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ToolResultContent::Raw(v) if v.is_null() => String::new(),
            ToolResultContent::Raw(v) => v.to_string(),
        }
    }
}

// ===================================================================
// Markers
// ===================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHistorySnapshotEntry {
    pub message_id: String,
    #[serde(default)]
    pub snapshot: serde_json::Value,
    #[serde(default)]
    pub is_snapshot_update: Option<bool>,
}

/// Written by Claude Code after a compaction; names the branch leaf it
/// summarizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub summary: String,
    #[serde(default)]
    pub leaf_uuid: Option<String>,
}

// ===================================================================
// Conversational view
// ===================================================================

/// A user or assistant entry, the only kinds that take part in turns.
#[derive(Debug, Clone, Copy)]
pub enum Utterance<'a> {
    User(&'a ConversationEntry),
    Assistant(&'a ConversationEntry),
}

impl<'a> Utterance<'a> {
    pub fn entry(&self) -> &'a ConversationEntry {
        match *self {
            Self::User(e) | Self::Assistant(e) => e,
        }
    }
}

impl TranscriptEntry {
    /// View this entry as part of the conversation, if it is one.
    pub fn utterance(&self) -> Option<Utterance<'_>> {
        match self {
            Self::User(e) => Some(Utterance::User(e)),
            Self::Assistant(e) => Some(Utterance::Assistant(e)),
            Self::FileHistorySnapshot(_) | Self::Summary(_) | Self::Other => None,
        }
    }

    /// Return the UUID if this entry type carries one.
    pub fn uuid(&self) -> Option<&str> {
        match self {
            Self::User(e) | Self::Assistant(e) => Some(&e.uuid),
            Self::FileHistorySnapshot(_) | Self::Summary(_) | Self::Other => None,
        }
    }
}

impl ConversationEntry {
    /// The content blocks of this entry; empty for plain-string content.
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.message.content {
            MessageContent::Blocks(b) => b,
            MessageContent::Text(_) => &[],
        }
    }

    /// The narrative text used to decide whether a user entry opens a turn.
    ///
    /// Only the first block is consulted: a plain string is the text, a
    /// block list yields the first block's text if it is a text block and
    /// `""` otherwise.
    pub fn prompt_text(&self) -> &str {
        match &self.message.content {
            MessageContent::Text(t) => t,
            MessageContent::Blocks(b) => match b.first() {
                Some(ContentBlock::Text(t)) => &t.text,
                _ => "",
            },
        }
    }

    /// Whether `prompt_text` has anything but whitespace.
    pub fn has_prompt_text(&self) -> bool {
        !self.prompt_text().trim().is_empty()
    }

    /// All text in the entry, every text block joined by a blank line.
    pub fn full_text(&self) -> String {
        match &self.message.content {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Blocks(b) => b
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text(t) => Some(t.text.trim()),
                    _ => None,
                })
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.blocks().iter().filter_map(|b| match b {
            ContentBlock::ToolUse(tu) => Some(tu),
            _ => None,
        })
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResultBlock> {
        self.blocks().iter().filter_map(|b| match b {
            ContentBlock::ToolResult(tr) => Some(tr),
            _ => None,
        })
    }

    /// Parsed `timestamp`, or `None` when absent or not RFC 3339.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ===================================================================
// Line reader
// ===================================================================

/// Iterator over the records of a JSONL stream. Blank lines are skipped;
/// the first undecodable line yields a `Decode` error and ends iteration.
pub struct RecordReader<R> {
    lines: std::io::Lines<R>,
    path: PathBuf,
    line: usize,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    /// `path` is only used to label errors.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            lines: reader.lines(),
            path: path.into(),
            line: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<TranscriptEntry, TranscriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    self.failed = true;
                    return Some(Err(TranscriptError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let decoded = serde_json::from_str::<TranscriptEntry>(line).map_err(|source| {
                self.failed = true;
                TranscriptError::Decode {
                    path: self.path.clone(),
                    line: self.line,
                    source,
                }
            });
            return Some(decoded);
        }
    }
}

/// Read every record of a transcript file, aborting on the first bad line.
pub fn load(path: &Path) -> Result<Vec<TranscriptEntry>, TranscriptError> {
    let file = File::open(path).map_err(|source| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = RecordReader::new(BufReader::new(file), path).collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded transcript");
    Ok(records)
}

/// Compaction summaries, in file order.
pub fn summaries(records: &[TranscriptEntry]) -> impl Iterator<Item = &str> {
    records.iter().filter_map(|r| match r {
        TranscriptEntry::Summary(s) => Some(s.summary.as_str()),
        _ => None,
    })
}

// ===================================================================
// Tests
// ===================================================================
