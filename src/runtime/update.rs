use crate::dispatch::TurnOutcome;
use crate::state::{SlotId, UiElement};

/// Messages from a running turn to the UI thread, in the order the turn
/// produced them.
#[derive(Debug)]
pub enum UiUpdate {
    Mount { slot: SlotId, element: UiElement },
    AppendText { slot: SlotId, text: String },
    Finalize { slot: SlotId, element: UiElement },
    TurnComplete { turn: u64, outcome: TurnOutcome },
    TurnCancelled { turn: u64, outcome: TurnOutcome },
    Error { turn: u64, message: String },
}
