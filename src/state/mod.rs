mod conversation;
mod transcript;
mod ui_element;

pub use conversation::{encode_attachment, ConversationHistory};
pub use transcript::{LineKind, Transcript, TranscriptEntry, TranscriptLine};
pub use ui_element::{SlotId, UiElement};
