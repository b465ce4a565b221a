use super::ui_element::{SlotId, UiElement};
use crate::tools::ToolView;

/// Slots allocated by the transcript itself (not by a turn) use this turn id.
const LOCAL_TURN: u64 = 0;

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    User(String),
    Notice(String),
    Error(String),
    Element {
        slot: SlotId,
        element: UiElement,
        closed: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    User,
    Assistant,
    ToolPending,
    Tool,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

impl TranscriptLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Everything shown in the history pane, in mount order.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_local_index: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::User(text.into()));
    }

    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::Notice(text.into()));
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::Error(text.into()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn next_local_slot(&mut self) -> SlotId {
        let slot = SlotId::new(LOCAL_TURN, self.next_local_index);
        self.next_local_index += 1;
        slot
    }

    pub fn mount_at(&mut self, slot: SlotId, element: UiElement) {
        if self.find(slot).is_some() {
            tracing::debug!(?slot, "ignoring duplicate mount");
            return;
        }
        self.entries.push(TranscriptEntry::Element {
            slot,
            element,
            closed: false,
        });
    }

    /// Appends streamed text to an open message. Returns false when the slot
    /// is unknown, closed, or not a message.
    pub fn append_text_at(&mut self, slot: SlotId, fragment: &str) -> bool {
        match self.find_mut(slot) {
            Some(TranscriptEntry::Element {
                element: UiElement::AiMessage { text },
                closed: false,
                ..
            }) => {
                text.push_str(fragment);
                true
            }
            _ => false,
        }
    }

    /// Swaps in the final element and closes the slot. A closed slot keeps
    /// its content.
    pub fn finalize_at(&mut self, slot: SlotId, replacement: UiElement) -> bool {
        match self.find_mut(slot) {
            Some(TranscriptEntry::Element {
                element, closed, ..
            }) if !*closed => {
                *element = replacement;
                *closed = true;
                true
            }
            _ => false,
        }
    }

    /// Closes the text bubbles of a finished turn. Tool placeholders keep
    /// whatever state the stream left them in.
    pub fn settle_turn(&mut self, turn: u64) {
        for entry in &mut self.entries {
            if let TranscriptEntry::Element {
                slot,
                element: UiElement::AiMessage { .. },
                closed,
            } = entry
            {
                if slot.turn == turn {
                    *closed = true;
                }
            }
        }
    }

    #[cfg(test)]
    pub fn element(&self, slot: SlotId) -> Option<&UiElement> {
        match self.find(slot)? {
            TranscriptEntry::Element { element, .. } => Some(element),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_closed(&self, slot: SlotId) -> Option<bool> {
        match self.find(slot)? {
            TranscriptEntry::Element { closed, .. } => Some(*closed),
            _ => None,
        }
    }

    pub fn tool_views(&self) -> impl Iterator<Item = &ToolView> {
        self.entries.iter().filter_map(|entry| match entry {
            TranscriptEntry::Element {
                element: UiElement::Tool(view),
                ..
            } => Some(view),
            _ => None,
        })
    }

    pub fn ai_messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            TranscriptEntry::Element {
                element: UiElement::AiMessage { text },
                ..
            } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn lines(&self) -> Vec<TranscriptLine> {
        let mut lines = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            let rendered = entry_lines(entry);
            if rendered.is_empty() {
                continue;
            }
            if idx > 0 && !lines.is_empty() {
                lines.push(TranscriptLine::new(LineKind::Notice, ""));
            }
            lines.extend(rendered);
        }
        lines
    }

    /// Drops the oldest entries until the rendered transcript fits `cap`
    /// lines. The newest entry always survives, and so do the slots of
    /// `live_turn`, which may still be appended to or finalized.
    pub fn enforce_line_cap(&mut self, cap: usize, live_turn: Option<u64>) -> usize {
        let counts: Vec<usize> = self
            .entries
            .iter()
            .map(|entry| entry_lines(entry).len() + 1)
            .collect();
        let mut total: usize = counts.iter().sum();
        let newest = self.entries.len().saturating_sub(1);

        let mut doomed = vec![false; self.entries.len()];
        for (idx, entry) in self.entries.iter().enumerate().take(newest) {
            if total <= cap {
                break;
            }
            let live = matches!(
                entry,
                TranscriptEntry::Element { slot, .. } if Some(slot.turn) == live_turn
            );
            if !live {
                total -= counts[idx];
                doomed[idx] = true;
            }
        }

        let dropped = doomed.iter().filter(|flag| **flag).count();
        if dropped > 0 {
            let mut flags = doomed.into_iter();
            self.entries.retain(|_| !flags.next().unwrap_or(false));
        }
        dropped
    }

    fn find(&self, slot: SlotId) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(
            |entry| matches!(entry, TranscriptEntry::Element { slot: s, .. } if *s == slot),
        )
    }

    fn find_mut(&mut self, slot: SlotId) -> Option<&mut TranscriptEntry> {
        self.entries.iter_mut().rev().find(
            |entry| matches!(entry, TranscriptEntry::Element { slot: s, .. } if *s == slot),
        )
    }
}

fn entry_lines(entry: &TranscriptEntry) -> Vec<TranscriptLine> {
    match entry {
        TranscriptEntry::User(text) => text
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                let prefix = if idx == 0 { "> " } else { "  " };
                TranscriptLine::new(LineKind::User, format!("{prefix}{line}"))
            })
            .collect(),
        TranscriptEntry::Notice(text) => vec![TranscriptLine::new(LineKind::Notice, text.clone())],
        TranscriptEntry::Error(text) => {
            vec![TranscriptLine::new(LineKind::Error, format!("[error] {text}"))]
        }
        TranscriptEntry::Element {
            element: UiElement::AiMessage { text },
            closed,
            ..
        } => {
            if text.is_empty() {
                return if *closed {
                    Vec::new()
                } else {
                    vec![TranscriptLine::new(LineKind::Assistant, "...")]
                };
            }
            text.lines()
                .map(|line| TranscriptLine::new(LineKind::Assistant, line))
                .collect()
        }
        TranscriptEntry::Element {
            element: UiElement::Tool(view),
            ..
        } => {
            let kind = if view.is_loading() {
                LineKind::ToolPending
            } else {
                LineKind::Tool
            };
            view.render_lines()
                .into_iter()
                .map(|line| TranscriptLine::new(kind, format!("  {line}")))
                .collect()
        }
    }
}
