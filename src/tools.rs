use crate::transcript::{ToolUseBlock, Utterance};
use crate::turns::Turn;
use std::collections::{BTreeMap, HashMap};

/// Name reported for results whose invocation was never seen.
pub const UNKNOWN_TOOL: &str = "Unknown";

/// Session-wide lookup from `tool_use` id to the invocation, so a result
/// can be rendered with the name and input of the call that produced it,
/// even when the call happened in an earlier turn.
#[derive(Debug, Default)]
pub struct ToolIndex<'a> {
    by_id: HashMap<&'a str, &'a ToolUseBlock>,
}

impl<'a> ToolIndex<'a> {
    /// Scan every assistant entry of every turn. A repeated id replaces the
    /// earlier invocation.
    pub fn build(turns: &[Turn<'a>]) -> Self {
        let mut by_id = HashMap::new();
        let invocations = turns
            .iter()
            .flat_map(|turn| turn.messages.iter())
            .filter_map(|u| match *u {
                Utterance::Assistant(e) => Some(e),
                Utterance::User(_) => None,
            })
            .flat_map(|e| e.tool_uses());

        for tool_use in invocations {
            if let Some(previous) = by_id.insert(tool_use.id.as_str(), tool_use) {
                tracing::warn!(
                    id = %tool_use.id,
                    previous = %previous.name,
                    current = %tool_use.name,
                    "duplicate tool_use id; keeping the later invocation"
                );
            }
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a ToolUseBlock> {
        self.by_id.get(id).copied()
    }

    /// Tool name for an invocation id, `Unknown` if uncorrelated.
    pub fn tool_name(&self, id: &str) -> &'a str {
        self.get(id).map_or(UNKNOWN_TOOL, |t| t.name.as_str())
    }

    /// The `file_path` input of the invocation, if it has one.
    pub fn file_path(&self, id: &str) -> Option<&'a str> {
        self.get(id)?.input.get("file_path")?.as_str()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Invocation counts per tool name, sorted by name.
    pub fn usage(&self) -> BTreeMap<&'a str, usize> {
        let mut counts = BTreeMap::new();
        for tool_use in self.by_id.values() {
            *counts.entry(tool_use.name.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use crate::turns::segment;
    use serde_json::json;

    #[test]
    fn indexes_invocations_across_turns() {
        let records = vec![
            user("u1", "read it"),
            assistant_tool_with("a1", "t1", "Read", json!({ "file_path": "/src/lib.rs" })),
            tool_result("r1", "t1", "fn main() {}"),
            user("u2", "now run it"),
            assistant_tool_with("a2", "t2", "Bash", json!({ "command": "cargo run" })),
            assistant_blocks(
                "a3",
                json!([
                    { "type": "text", "text": "and grep" },
                    { "type": "tool_use", "id": "t3", "name": "Grep", "input": { "pattern": "x" } },
                    { "type": "tool_use", "id": "t4", "name": "Bash", "input": { "command": "ls" } }
                ]),
            ),
        ];
        let turns = segment(&records);
        assert_eq!(turns.len(), 2);

        let index = ToolIndex::build(&turns);
        assert_eq!(index.len(), 4);
        assert_eq!(index.tool_name("t1"), "Read");
        assert_eq!(index.tool_name("t3"), "Grep");
        assert_eq!(index.file_path("t1"), Some("/src/lib.rs"));
        assert_eq!(index.file_path("t2"), None);

        let usage: Vec<_> = index.usage().into_iter().collect();
        assert_eq!(usage, vec![("Bash", 2), ("Grep", 1), ("Read", 1)]);
    }

    #[test]
    fn unknown_ids_degrade_to_unknown() {
        let index = ToolIndex::default();
        assert_eq!(index.len(), 0);
        assert_eq!(index.tool_name("missing"), UNKNOWN_TOOL);
        assert!(index.file_path("missing").is_none());
    }

    #[test]
    fn duplicate_ids_keep_the_last_invocation() {
        let records = vec![
            user("u1", "go"),
            assistant_tool("a1", "dup", "Read"),
            assistant_tool("a2", "dup", "Write"),
        ];
        let turns = segment(&records);
        let index = ToolIndex::build(&turns);
        assert_eq!(index.len(), 1);
        assert_eq!(index.tool_name("dup"), "Write");
    }

    #[test]
    fn tool_results_carried_by_users_are_not_invocations() {
        let records = vec![user("u1", "go"), tool_result("r1", "t9", "out")];
        let turns = segment(&records);
        assert_eq!(ToolIndex::build(&turns).len(), 0);
    }
}
