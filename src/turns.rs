use crate::transcript::{TranscriptEntry, Utterance};

/// One user-initiated exchange: the prompt plus everything up to the next
/// prompt.
#[derive(Debug, Clone)]
pub struct Turn<'a> {
    /// 1-based position in the conversation.
    pub index: usize,
    /// `messages[0]` is always a user entry with prompt text.
    pub messages: Vec<Utterance<'a>>,
}

/// Group the conversation into turns.
///
/// A user entry with prompt text opens a new turn. Everything else (tool
/// result carriers, assistant entries) joins the open turn, or is dropped
/// if no turn has started yet. Markers never take part.
pub fn segment(records: &[TranscriptEntry]) -> Vec<Turn<'_>> {
    let mut turns = Vec::new();
    let mut current: Option<Turn<'_>> = None;

    for utterance in records.iter().filter_map(TranscriptEntry::utterance) {
        match utterance {
            Utterance::User(entry) if entry.has_prompt_text() => {
                if let Some(turn) = current.take() {
                    turns.push(turn);
                }
                current = Some(Turn {
                    index: turns.len() + 1,
                    messages: vec![utterance],
                });
            }
            _ => match current.as_mut() {
                Some(turn) => turn.messages.push(utterance),
                None => tracing::debug!(
                    uuid = %utterance.entry().uuid,
                    "dropping entry before the first prompt"
                ),
            },
        }
    }

    if let Some(turn) = current {
        turns.push(turn);
    }
    turns
}
