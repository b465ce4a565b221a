use super::ledger::{SelectedTool, ToolSlotState, TurnLedger};
use super::surface::UiSurface;
use crate::state::UiElement;
use crate::tools::ToolRegistry;
use crate::types::{AgentEvent, ToolCall};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "backend selected tool '{0}' but no view is registered for it; client and backend tool lists have drifted"
    )]
    UnknownTool(String),
}

/// What a finished turn leaves behind once its ledger is gone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Streamed text of every run, in the order the runs first spoke.
    pub assistant_text: String,
    pub selected_tool: Option<String>,
    pub tool_finalized: bool,
}

/// Projects one turn's event stream onto a `UiSurface`, one event at a time
/// and strictly in arrival order.
pub struct EventDispatcher<'r, S: UiSurface> {
    registry: &'r ToolRegistry,
    surface: S,
    ledger: TurnLedger,
}

impl<'r, S: UiSurface> EventDispatcher<'r, S> {
    pub fn new(registry: &'r ToolRegistry, surface: S) -> Self {
        Self {
            registry,
            surface,
            ledger: TurnLedger::new(),
        }
    }

    pub fn ledger(&self) -> &TurnLedger {
        &self.ledger
    }

    pub fn dispatch(&mut self, event: AgentEvent) -> Result<(), DispatchError> {
        match event {
            AgentEvent::ModelEnd { tool_calls, .. } => self.on_model_end(&tool_calls)?,
            AgentEvent::ToolsEnd { tool_result, .. } => self.on_tools_end(&tool_result),
            AgentEvent::ChatModelStream { run_id, text } => {
                self.on_chat_model_stream(&run_id, &text)
            }
            AgentEvent::Other { .. } => {}
        }
        Ok(())
    }

    fn on_model_end(&mut self, tool_calls: &[ToolCall]) -> Result<(), DispatchError> {
        let Some(call) = tool_calls.first() else {
            return Ok(());
        };

        if let Some(selected) = self.ledger.selected_tool() {
            tracing::debug!(
                selected = %selected.kind,
                ignored = %call.kind,
                "turn already has a tool view; later tool call ignored"
            );
            return Ok(());
        }

        let component = self
            .registry
            .get(&call.kind)
            .ok_or_else(|| DispatchError::UnknownTool(call.kind.clone()))?;

        let slot = self.surface.mount(UiElement::Tool((component.loading)()));
        tracing::info!(tool = %call.kind, calls = tool_calls.len(), "tool view mounted");

        if let Err(rejected) = self
            .ledger
            .select_tool(SelectedTool::new(call.kind.clone(), component, slot))
        {
            tracing::warn!(tool = %rejected.kind, "tool slot latched twice");
        }
        Ok(())
    }

    fn on_tools_end(&mut self, tool_result: &Value) {
        let Some(tool) = self.ledger.finalize_tool() else {
            tracing::debug!("tool result without an open tool view ignored");
            return;
        };

        let slot = tool.slot;
        let final_view = (tool.component.final_view)(tool_result);
        tracing::info!(tool = %tool.kind, "tool view finalized");
        self.surface.finalize(slot, UiElement::Tool(final_view));
    }

    fn on_chat_model_stream(&mut self, run_id: &str, text: &str) {
        let slot = match self.ledger.sink_mut(run_id) {
            Some(sink) => {
                sink.push(text);
                sink.slot
            }
            None => {
                let slot = self.surface.mount(UiElement::ai_message());
                self.ledger.open_sink(run_id, slot).push(text);
                slot
            }
        };

        if !text.is_empty() {
            self.surface.append_text(slot, text);
        }
    }

    /// Ends the turn. The ledger is dropped here; only the summary survives.
    pub fn finish(self) -> TurnOutcome {
        let assistant_text = self
            .ledger
            .sinks()
            .map(|(_, sink)| sink.content().trim())
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let (selected_tool, tool_finalized) = match self.ledger.selected_tool() {
            Some(tool) => (
                Some(tool.kind.clone()),
                tool.state() == ToolSlotState::Finalized,
            ),
            None => (None, false),
        };

        TurnOutcome {
            assistant_text,
            selected_tool,
            tool_finalized,
        }
    }
}
