use crate::transcript::{ContentBlock, ConversationEntry, ToolResultBlock, Utterance};
use crate::turns::Turn;
use std::mem;

/// Characters removed from titles so they are safe inside a TOC link.
const TITLE_STRIP: &[char] = &['#', '[', ']', '`', '*', '_'];
const TITLE_CHARS: usize = 50;

/// Extension of every generated page.
pub const PAGE_EXT: &str = "md";

// ===================================================================
// Pages
// ===================================================================

/// One tool-invoking assistant entry and the results that answered it.
/// The whole entry is kept since it may carry several invocations.
#[derive(Debug, Clone)]
pub struct ToolInteraction<'a> {
    pub invocation: &'a ConversationEntry,
    pub results: Vec<&'a ToolResultBlock>,
}

/// One renderable unit of a turn. `page_index` is 1-based and shared by
/// every kind of page within the turn.
#[derive(Debug, Clone)]
pub enum Page<'a> {
    User {
        turn_index: usize,
        page_index: usize,
        user: &'a ConversationEntry,
    },
    Text {
        turn_index: usize,
        page_index: usize,
        assistant: &'a ConversationEntry,
    },
    Tool {
        turn_index: usize,
        page_index: usize,
        interactions: Vec<ToolInteraction<'a>>,
    },
}

impl Page<'_> {
    pub fn turn_index(&self) -> usize {
        match self {
            Self::User { turn_index, .. }
            | Self::Text { turn_index, .. }
            | Self::Tool { turn_index, .. } => *turn_index,
        }
    }

    pub fn page_index(&self) -> usize {
        match self {
            Self::User { page_index, .. }
            | Self::Text { page_index, .. }
            | Self::Tool { page_index, .. } => *page_index,
        }
    }

    /// Stable file name of the page within the book source directory.
    pub fn filename(&self) -> String {
        match self {
            Self::User { turn_index, .. } => format!("turn_{turn_index}_user.{PAGE_EXT}"),
            Self::Text {
                turn_index,
                page_index,
                ..
            } => format!("turn_{turn_index}_text_{page_index}.{PAGE_EXT}"),
            Self::Tool {
                turn_index,
                page_index,
                ..
            } => format!("turn_{turn_index}_tool_{page_index}.{PAGE_EXT}"),
        }
    }
}

/// A turn split into pages, ready for rendering.
#[derive(Debug, Clone)]
pub struct PagedTurn<'a> {
    pub turn_index: usize,
    pub title: String,
    pub pages: Vec<Page<'a>>,
}

// ===================================================================
// Classification and titles
// ===================================================================

/// Whether an assistant entry reads as narrative: the first block that is
/// not thinking is text. Entries starting with a tool call, with some other
/// block, or with nothing at all are grouped as tool interactions.
pub fn starts_with_text(entry: &ConversationEntry) -> bool {
    entry
        .blocks()
        .iter()
        .find(|b| !matches!(b, ContentBlock::Thinking(_)))
        .is_some_and(|b| matches!(b, ContentBlock::Text(_)))
}

/// Title of a turn, taken from its first prompt.
pub fn title(turn: &Turn<'_>) -> String {
    turn.messages
        .iter()
        .find_map(|u| match *u {
            Utterance::User(e) if e.has_prompt_text() => Some(clean_title(e.prompt_text())),
            _ => None,
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Turn {}", turn.index))
}

fn clean_title(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .take(TITLE_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|c| !TITLE_STRIP.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

// ===================================================================
// Partitioning
// ===================================================================

/// Accumulator for the run of tool interactions currently being grouped.
///
/// `Grouping` always owns an open interaction: it is flushed into
/// `finished` before another one opens, and the whole group becomes a page
/// only through `close`.
#[derive(Debug, Default)]
enum ToolGroup<'a> {
    #[default]
    Idle,
    Grouping {
        page_index: usize,
        finished: Vec<ToolInteraction<'a>>,
        open: ToolInteraction<'a>,
    },
}

impl<'a> ToolGroup<'a> {
    /// Flush the open interaction and turn the group into a page.
    fn close(&mut self, turn_index: usize) -> Option<Page<'a>> {
        match mem::take(self) {
            ToolGroup::Idle => None,
            ToolGroup::Grouping {
                page_index,
                mut finished,
                open,
            } => {
                finished.push(open);
                Some(Page::Tool {
                    turn_index,
                    page_index,
                    interactions: finished,
                })
            }
        }
    }
}

/// Per-turn pass state.
struct Pager<'a> {
    turn_index: usize,
    next_index: usize,
    pages: Vec<Page<'a>>,
    group: ToolGroup<'a>,
}

impl<'a> Pager<'a> {
    fn new(turn_index: usize) -> Self {
        Self {
            turn_index,
            next_index: 1,
            pages: Vec::new(),
            group: ToolGroup::Idle,
        }
    }

    fn take_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn close_group(&mut self) {
        if let Some(page) = self.group.close(self.turn_index) {
            self.pages.push(page);
        }
    }

    fn prompt(&mut self, user: &'a ConversationEntry) {
        self.close_group();
        let page_index = self.take_index();
        self.pages.push(Page::User {
            turn_index: self.turn_index,
            page_index,
            user,
        });
    }

    fn narration(&mut self, assistant: &'a ConversationEntry) {
        self.close_group();
        let page_index = self.take_index();
        self.pages.push(Page::Text {
            turn_index: self.turn_index,
            page_index,
            assistant,
        });
    }

    fn invocation(&mut self, invocation: &'a ConversationEntry) {
        let fresh = ToolInteraction {
            invocation,
            results: Vec::new(),
        };
        if let ToolGroup::Grouping { finished, open, .. } = &mut self.group {
            finished.push(mem::replace(open, fresh));
            return;
        }
        let page_index = self.take_index();
        self.group = ToolGroup::Grouping {
            page_index,
            finished: Vec::new(),
            open: fresh,
        };
    }

    fn results(&mut self, carrier: &'a ConversationEntry) {
        match &mut self.group {
            ToolGroup::Grouping { open, .. } => open.results.extend(carrier.tool_results()),
            ToolGroup::Idle => tracing::debug!(
                turn = self.turn_index,
                uuid = %carrier.uuid,
                "dropping tool result with no open interaction"
            ),
        }
    }

    fn finish(mut self) -> Vec<Page<'a>> {
        self.close_group();
        self.pages
    }
}

/// Split one turn into pages.
pub fn partition_turn<'a>(turn: &Turn<'a>) -> PagedTurn<'a> {
    let mut pager = Pager::new(turn.index);
    for utterance in &turn.messages {
        match *utterance {
            Utterance::User(e) if e.has_prompt_text() => pager.prompt(e),
            Utterance::User(e) => pager.results(e),
            Utterance::Assistant(e) if starts_with_text(e) => pager.narration(e),
            Utterance::Assistant(e) => pager.invocation(e),
        }
    }
    PagedTurn {
        turn_index: turn.index,
        title: title(turn),
        pages: pager.finish(),
    }
}

/// Split every turn into pages. Pure: the same turns always give the same
/// pages.
pub fn partition<'a>(turns: &[Turn<'a>]) -> Vec<PagedTurn<'a>> {
    turns.iter().map(partition_turn).collect()
}
