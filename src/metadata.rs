use crate::transcript::{TranscriptEntry, Utterance};

/// Facts about the whole session, shown on the book's introduction page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionMetadata {
    /// First session id seen on a user or assistant entry.
    pub session_id: Option<String>,
    /// Raw timestamp of the first and last user/assistant entries.
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub version: Option<String>,
    /// Distinct assistant models in order of first use.
    pub models: Vec<String>,
    /// Compaction summaries collected from the inputs before merging.
    pub summaries: Vec<String>,
}

impl SessionMetadata {
    /// Scan the merged entry list. Only user and assistant entries count.
    pub fn extract(records: &[TranscriptEntry]) -> Self {
        let mut meta = SessionMetadata::default();
        for utterance in records.iter().filter_map(TranscriptEntry::utterance) {
            let entry = utterance.entry();
            first(&mut meta.session_id, &entry.session_id);
            first(&mut meta.cwd, &entry.cwd);
            first(&mut meta.git_branch, &entry.git_branch);
            first(&mut meta.version, &entry.version);
            if let Some(ts) = &entry.timestamp {
                if meta.started_at.is_none() {
                    meta.started_at = Some(ts.clone());
                }
                meta.ended_at = Some(ts.clone());
            }
            if let Utterance::Assistant(e) = utterance {
                if let Some(model) = &e.message.model {
                    if !meta.models.contains(model) {
                        meta.models.push(model.clone());
                    }
                }
            }
        }
        meta
    }

    pub fn with_summaries<I, S>(mut self, summaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summaries.extend(summaries.into_iter().map(Into::into));
        self
    }
}

fn first(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}
