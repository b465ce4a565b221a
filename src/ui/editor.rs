use super::text_metrics::clamp_to_char_boundary_left;
use crate::runtime::frontend::ScrollAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PAGE_ROWS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptAction {
    None,
    Submit(String),
    Interrupt,
    Scroll(ScrollAction),
    Quit,
}

/// Single prompt line editor. Up/Down scroll the transcript; Alt+Up/Down
/// recall earlier prompts.
#[derive(Debug, Default)]
pub struct PromptEditor {
    buffer: String,
    cursor: usize,
    sent: Vec<String>,
    recall_index: Option<usize>,
    draft: Option<String>,
}

impl PromptEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn prev_boundary(&self) -> usize {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer[..cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer[cursor..]
            .chars()
            .next()
            .map(|ch| cursor + ch.len_utf8())
            .unwrap_or(self.buffer.len())
    }

    pub fn insert_str(&mut self, text: &str) {
        self.recall_index = None;
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, text);
        self.cursor = cursor + text.len();
    }

    fn backspace(&mut self) {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_boundary();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    fn delete(&mut self) {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_boundary();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    fn kill_to_start(&mut self) {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.replace_range(..cursor, "");
        self.cursor = 0;
    }

    fn kill_to_end(&mut self) {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.truncate(cursor);
    }

    fn set_buffer(&mut self, text: String) {
        self.cursor = text.len();
        self.buffer = text;
    }

    fn recall_previous(&mut self) {
        if self.sent.is_empty() {
            return;
        }
        let index = match self.recall_index {
            Some(idx) => idx.saturating_sub(1),
            None => {
                self.draft = Some(self.buffer.clone());
                self.sent.len() - 1
            }
        };
        self.recall_index = Some(index);
        self.set_buffer(self.sent[index].clone());
    }

    fn recall_next(&mut self) {
        let Some(idx) = self.recall_index else {
            return;
        };
        if idx + 1 < self.sent.len() {
            self.recall_index = Some(idx + 1);
            self.set_buffer(self.sent[idx + 1].clone());
        } else {
            self.recall_index = None;
            let draft = self.draft.take().unwrap_or_default();
            self.set_buffer(draft);
        }
    }

    fn submit(&mut self) -> Option<String> {
        let value = self.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        if self.sent.last() != Some(&value) {
            self.sent.push(value.clone());
        }
        self.recall_index = None;
        self.draft = None;
        self.buffer.clear();
        self.cursor = 0;
        Some(value)
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> PromptAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if ctrl => return PromptAction::Interrupt,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return PromptAction::Quit;
                }
                self.delete();
            }
            KeyCode::Char('j') if ctrl => self.insert_str("\n"),
            KeyCode::Char('u') if ctrl => self.kill_to_start(),
            KeyCode::Char('k') if ctrl => self.kill_to_end(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.buffer.len(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_str("\n")
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return PromptAction::Submit(value);
                }
            }
            KeyCode::Up if alt => self.recall_previous(),
            KeyCode::Down if alt => self.recall_next(),
            KeyCode::Up => return PromptAction::Scroll(ScrollAction::LineUp),
            KeyCode::Down => return PromptAction::Scroll(ScrollAction::LineDown),
            KeyCode::PageUp => return PromptAction::Scroll(ScrollAction::PageUp(PAGE_ROWS)),
            KeyCode::PageDown => return PromptAction::Scroll(ScrollAction::PageDown(PAGE_ROWS)),
            KeyCode::Home if ctrl => return PromptAction::Scroll(ScrollAction::Home),
            KeyCode::End if ctrl => return PromptAction::Scroll(ScrollAction::End),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Left => self.cursor = self.prev_boundary(),
            KeyCode::Right => self.cursor = self.next_boundary(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(ch) if !ctrl && !alt => {
                let mut encoded = [0u8; 4];
                self.insert_str(ch.encode_utf8(&mut encoded));
            }
            _ => {}
        }
        PromptAction::None
    }
}
