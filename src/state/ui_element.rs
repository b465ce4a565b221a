use crate::tools::ToolView;

/// Identifies one mounted element. `turn` scopes the index so slots handed out
/// by different turns never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    pub turn: u64,
    pub index: usize,
}

impl SlotId {
    pub fn new(turn: u64, index: usize) -> Self {
        Self { turn, index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiElement {
    /// Assistant text bubble fed by one streamed run.
    AiMessage { text: String },
    /// Tool result view, loading or final.
    Tool(ToolView),
}

impl UiElement {
    pub fn ai_message() -> Self {
        Self::AiMessage {
            text: String::new(),
        }
    }

    pub fn is_loading_tool(&self) -> bool {
        matches!(self, Self::Tool(view) if view.is_loading())
    }
}
