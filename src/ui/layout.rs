use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Maximum rows the prompt pane grows to before it scrolls.
pub const MAX_PROMPT_ROWS: u16 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatLayout {
    pub status: Rect,
    pub transcript: Rect,
    pub prompt: Rect,
}

/// Status line on top, transcript in the middle, prompt pinned to the bottom.
pub fn split_chat_layout(area: Rect, prompt_rows: u16) -> ChatLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(prompt_rows.clamp(1, MAX_PROMPT_ROWS)),
        ])
        .split(area);

    ChatLayout {
        status: chunks[0],
        transcript: chunks[1],
        prompt: chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stacks_status_transcript_prompt() {
        let panes = split_chat_layout(Rect::new(0, 0, 80, 20), 3);

        assert_eq!(panes.status.height, 1);
        assert_eq!(panes.transcript.height, 16);
        assert_eq!(panes.prompt.height, 3);
        assert_eq!(panes.transcript.y, 1);
        assert_eq!(panes.prompt.y, 17);
    }

    #[test]
    fn prompt_rows_are_clamped() {
        let panes = split_chat_layout(Rect::new(0, 0, 80, 30), 40);
        assert_eq!(panes.prompt.height, MAX_PROMPT_ROWS);

        let panes = split_chat_layout(Rect::new(0, 0, 80, 30), 0);
        assert_eq!(panes.prompt.height, 1);
    }
}
