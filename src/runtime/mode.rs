use super::context::RuntimeContext;
use super::frontend::{ScrollAction, UserInputEvent};
use super::UiUpdate;

pub trait RuntimeMode {
    fn on_user_input(&mut self, input: String, ctx: &mut RuntimeContext);
    fn on_model_update(&mut self, update: UiUpdate, ctx: &mut RuntimeContext);
    fn on_interrupt(&mut self, _ctx: &mut RuntimeContext) {}
    fn on_scroll(&mut self, _action: ScrollAction) {}
    fn is_turn_in_progress(&self) -> bool;

    fn on_frontend_event(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext) {
        match event {
            UserInputEvent::Text(input) => self.on_user_input(input, ctx),
            UserInputEvent::Interrupt => self.on_interrupt(ctx),
            UserInputEvent::Scroll(action) => self.on_scroll(action),
        }
    }
}
