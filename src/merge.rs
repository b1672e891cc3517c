use crate::transcript::TranscriptEntry;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One input transcript, labelled for logging.
#[derive(Debug)]
pub struct Source {
    pub name: String,
    pub records: Vec<TranscriptEntry>,
}

/// Identity used to drop entries that appear in more than one source.
/// Snapshots reuse the uuid of the user message they belong to, so the two
/// kinds are kept apart.
#[derive(Debug, PartialEq, Eq, Hash)]
enum RecordKey {
    Message(String),
    Snapshot(String),
}

impl RecordKey {
    fn of(entry: &TranscriptEntry) -> Option<Self> {
        match entry {
            TranscriptEntry::FileHistorySnapshot(s) => Some(Self::Snapshot(s.message_id.clone())),
            other => other.uuid().map(|id| Self::Message(id.to_string())),
        }
    }
}

/// The earliest conversational timestamp of a source: that of its first
/// user or assistant entry carrying a parseable one.
pub fn first_timestamp(records: &[TranscriptEntry]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .filter_map(TranscriptEntry::utterance)
        .find_map(|u| u.entry().parsed_timestamp())
}

/// Combine several transcripts (e.g. a session continued after compaction)
/// into one chronological, duplicate-free stream.
///
/// Sources are ordered by `first_timestamp`; sources without one go first,
/// and ties keep their input order. Summary markers are dropped, and an
/// entry whose identity was already seen is skipped (first one wins).
pub fn merge(sources: Vec<Source>) -> Vec<TranscriptEntry> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, Source)> = sources
        .into_iter()
        .map(|s| (first_timestamp(&s.records), s))
        .collect();
    // Stable: equal keys keep input order.
    keyed.sort_by_key(|(ts, _)| *ts);

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let mut duplicates = 0usize;

    for (ts, source) in keyed {
        tracing::debug!(
            source = %source.name,
            first_timestamp = ?ts,
            records = source.records.len(),
            "merging source"
        );
        for entry in source.records {
            if matches!(entry, TranscriptEntry::Summary(_)) {
                continue;
            }
            if let Some(key) = RecordKey::of(&entry) {
                if !seen.insert(key) {
                    duplicates += 1;
                    continue;
                }
            }
            merged.push(entry);
        }
    }

    if duplicates > 0 {
        tracing::debug!(duplicates, "dropped entries repeated across sources");
    }
    merged
}
