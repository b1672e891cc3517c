//! Transcript entry builders shared by the unit tests.

use crate::transcript::TranscriptEntry;
use serde_json::{Value, json};

fn entry(value: Value) -> TranscriptEntry {
    serde_json::from_value(value).unwrap()
}

pub fn user(uuid: &str, text: &str) -> TranscriptEntry {
    entry(json!({
        "type": "user",
        "uuid": uuid,
        "sessionId": "sess-1",
        "message": { "role": "user", "content": text }
    }))
}

pub fn user_at(uuid: &str, text: &str, timestamp: &str) -> TranscriptEntry {
    entry(json!({
        "type": "user",
        "uuid": uuid,
        "sessionId": "sess-1",
        "timestamp": timestamp,
        "message": { "role": "user", "content": text }
    }))
}

pub fn assistant_blocks(uuid: &str, blocks: Value) -> TranscriptEntry {
    entry(json!({
        "type": "assistant",
        "uuid": uuid,
        "sessionId": "sess-1",
        "message": { "role": "assistant", "model": "claude-test", "content": blocks }
    }))
}

pub fn assistant_text(uuid: &str, text: &str) -> TranscriptEntry {
    assistant_blocks(uuid, json!([{ "type": "text", "text": text }]))
}

pub fn assistant_tool(uuid: &str, tool_id: &str, name: &str) -> TranscriptEntry {
    assistant_tool_with(uuid, tool_id, name, json!({}))
}

pub fn assistant_tool_with(uuid: &str, tool_id: &str, name: &str, input: Value) -> TranscriptEntry {
    assistant_blocks(
        uuid,
        json!([{ "type": "tool_use", "id": tool_id, "name": name, "input": input }]),
    )
}

pub fn tool_result(uuid: &str, tool_id: &str, content: &str) -> TranscriptEntry {
    entry(json!({
        "type": "user",
        "uuid": uuid,
        "sessionId": "sess-1",
        "message": { "role": "user", "content": [
            { "type": "tool_result", "tool_use_id": tool_id, "content": content }
        ]}
    }))
}

pub fn snapshot(message_id: &str) -> TranscriptEntry {
    entry(json!({
        "type": "file-history-snapshot",
        "messageId": message_id,
        "snapshot": {}
    }))
}

pub fn summary(text: &str) -> TranscriptEntry {
    entry(json!({ "type": "summary", "summary": text, "leafUuid": "leaf" }))
}
