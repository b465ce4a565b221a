use crate::runtime::UiUpdate;
use crate::state::{SlotId, Transcript, UiElement};
use tokio::sync::mpsc;

/// Where the dispatcher mounts, feeds and closes UI elements.
pub trait UiSurface {
    fn mount(&mut self, element: UiElement) -> SlotId;
    fn append_text(&mut self, slot: SlotId, text: &str);
    /// Replaces the element in `slot` and closes it to further updates.
    fn finalize(&mut self, slot: SlotId, element: UiElement);
}

impl<S: UiSurface + ?Sized> UiSurface for &mut S {
    fn mount(&mut self, element: UiElement) -> SlotId {
        (**self).mount(element)
    }

    fn append_text(&mut self, slot: SlotId, text: &str) {
        (**self).append_text(slot, text)
    }

    fn finalize(&mut self, slot: SlotId, element: UiElement) {
        (**self).finalize(slot, element)
    }
}

/// Publishes surface operations to the UI thread as `UiUpdate`s.
pub struct ChannelSurface {
    turn: u64,
    next_index: usize,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
}

impl ChannelSurface {
    pub fn new(turn: u64, update_tx: mpsc::UnboundedSender<UiUpdate>) -> Self {
        Self {
            turn,
            next_index: 0,
            update_tx,
        }
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    fn emit(&self, update: UiUpdate) {
        let _ = self.update_tx.send(update);
    }
}

impl UiSurface for ChannelSurface {
    fn mount(&mut self, element: UiElement) -> SlotId {
        let slot = SlotId::new(self.turn, self.next_index);
        self.next_index += 1;
        self.emit(UiUpdate::Mount { slot, element });
        slot
    }

    fn append_text(&mut self, slot: SlotId, text: &str) {
        self.emit(UiUpdate::AppendText {
            slot,
            text: text.to_string(),
        });
    }

    fn finalize(&mut self, slot: SlotId, element: UiElement) {
        self.emit(UiUpdate::Finalize { slot, element });
    }
}

impl UiSurface for Transcript {
    fn mount(&mut self, element: UiElement) -> SlotId {
        let slot = self.next_local_slot();
        self.mount_at(slot, element);
        slot
    }

    fn append_text(&mut self, slot: SlotId, text: &str) {
        if !self.append_text_at(slot, text) {
            tracing::debug!(?slot, "text for a closed or unknown slot dropped");
        }
    }

    fn finalize(&mut self, slot: SlotId, element: UiElement) {
        if !self.finalize_at(slot, element) {
            tracing::debug!(?slot, "finalize for a closed or unknown slot dropped");
        }
    }
}
