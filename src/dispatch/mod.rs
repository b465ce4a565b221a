//! Turns one conversation turn's agent events into incremental UI state.

mod dispatcher;
mod ledger;
mod surface;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchError, EventDispatcher, TurnOutcome};
pub use ledger::{SelectedTool, TextSink, ToolSlotState, TurnLedger};
pub use surface::{ChannelSurface, UiSurface};
