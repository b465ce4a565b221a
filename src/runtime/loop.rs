use super::{
    context::RuntimeContext, frontend::FrontendAdapter, mode::RuntimeMode, UiUpdate,
};
use tokio::sync::mpsc;

pub struct Runtime<M: RuntimeMode> {
    pub mode: M,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
}

impl<M: RuntimeMode> Runtime<M> {
    pub fn new(mode: M, update_rx: mpsc::UnboundedReceiver<UiUpdate>) -> Self {
        Self { mode, update_rx }
    }

    /// Applies pending turn updates, renders, then handles at most one input
    /// event per tick until the frontend asks to quit.
    pub async fn run<F: FrontendAdapter<M>>(&mut self, frontend: &mut F, ctx: &mut RuntimeContext) {
        loop {
            self.drain_updates(ctx);
            frontend.render(&self.mode);
            if frontend.should_quit() {
                break;
            }

            if let Some(event) = frontend.poll_user_input(&self.mode) {
                self.mode.on_frontend_event(event, ctx);
            }
            tokio::task::yield_now().await;
        }

        if self.mode.is_turn_in_progress() {
            ctx.cancel_turn();
        }
    }

    fn drain_updates(&mut self, ctx: &mut RuntimeContext) {
        while let Ok(update) = self.update_rx.try_recv() {
            self.mode.on_model_update(update, ctx);
        }
    }
}
