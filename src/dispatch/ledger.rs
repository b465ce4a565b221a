use crate::state::SlotId;
use crate::tools::ToolComponent;
use std::cell::OnceCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSlotState {
    Loading,
    Finalized,
}

#[derive(Debug)]
pub struct SelectedTool {
    pub kind: String,
    pub component: ToolComponent,
    pub slot: SlotId,
    state: ToolSlotState,
}

impl SelectedTool {
    pub fn new(kind: impl Into<String>, component: ToolComponent, slot: SlotId) -> Self {
        Self {
            kind: kind.into(),
            component,
            slot,
            state: ToolSlotState::Loading,
        }
    }

    pub fn state(&self) -> ToolSlotState {
        self.state
    }
}

#[derive(Debug)]
pub struct TextSink {
    pub slot: SlotId,
    content: String,
}

impl TextSink {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn push(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }
}

/// Per-turn dispatch state. Created empty when a turn starts and dropped with
/// the dispatcher when the stream ends.
#[derive(Debug, Default)]
pub struct TurnLedger {
    sinks: HashMap<String, TextSink>,
    sink_order: Vec<String>,
    selected_tool: OnceCell<SelectedTool>,
}

impl TurnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_tool(&self) -> Option<&SelectedTool> {
        self.selected_tool.get()
    }

    #[cfg(test)]
    pub fn has_selected_tool(&self) -> bool {
        self.selected_tool.get().is_some()
    }

    /// Latches the turn's tool. The slot is write-once: a second selection is
    /// handed back untouched.
    pub fn select_tool(&mut self, tool: SelectedTool) -> Result<(), SelectedTool> {
        self.selected_tool.set(tool)
    }

    /// Moves the tool slot from loading to finalized. Returns the tool only on
    /// that transition.
    pub fn finalize_tool(&mut self) -> Option<&SelectedTool> {
        let tool = self.selected_tool.get_mut()?;
        if tool.state == ToolSlotState::Finalized {
            return None;
        }
        tool.state = ToolSlotState::Finalized;
        Some(&*tool)
    }

    pub fn sink_mut(&mut self, run_id: &str) -> Option<&mut TextSink> {
        self.sinks.get_mut(run_id)
    }

    pub fn open_sink(&mut self, run_id: &str, slot: SlotId) -> &mut TextSink {
        if !self.sinks.contains_key(run_id) {
            self.sink_order.push(run_id.to_string());
        }
        self.sinks.entry(run_id.to_string()).or_insert(TextSink {
            slot,
            content: String::new(),
        })
    }

    #[cfg(test)]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Sinks in the order they were opened.
    pub fn sinks(&self) -> impl Iterator<Item = (&str, &TextSink)> {
        self.sink_order
            .iter()
            .filter_map(|run_id| self.sinks.get(run_id).map(|sink| (run_id.as_str(), sink)))
    }
}
