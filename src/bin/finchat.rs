use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use finchat::app::{build_runtime, TuiMode};
use finchat::config::Config;
use finchat::logging::init_tracing;
use finchat::runtime::frontend::{FrontendAdapter, UserInputEvent};
use finchat::terminal::TerminalGuard;
use finchat::ui::editor::{PromptAction, PromptEditor};
use finchat::ui::layout::split_chat_layout;
use finchat::ui::render::{prompt_visual_rows, render_prompt, render_status_line, render_transcript};
use ratatui::widgets::Clear;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(16);

struct ManagedTuiFrontend {
    terminal: TerminalGuard,
    editor: PromptEditor,
    quit: bool,
}

impl ManagedTuiFrontend {
    fn new() -> Result<Self> {
        let terminal = TerminalGuard::enter()?;
        Self::drain_startup_events();
        Ok(Self {
            terminal,
            editor: PromptEditor::new(),
            quit: false,
        })
    }

    fn drain_startup_events() {
        for _ in 0..1024 {
            match event::poll(Duration::from_millis(0)) {
                Ok(true) => {
                    if event::read().is_err() {
                        break;
                    }
                }
                Ok(false) | Err(_) => break,
            }
        }
    }
}

impl FrontendAdapter<TuiMode> for ManagedTuiFrontend {
    fn poll_user_input(&mut self, mode: &TuiMode) -> Option<UserInputEvent> {
        if mode.quit_requested() {
            self.quit = true;
            return None;
        }

        let Ok(has_event) = event::poll(POLL_INTERVAL) else {
            self.quit = true;
            return None;
        };
        if !has_event {
            return None;
        }

        let Ok(ev) = event::read() else {
            self.quit = true;
            return None;
        };

        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                match self.editor.apply_key(key) {
                    PromptAction::None => None,
                    PromptAction::Submit(text) => Some(UserInputEvent::Text(text)),
                    PromptAction::Interrupt => Some(UserInputEvent::Interrupt),
                    PromptAction::Scroll(action) => Some(UserInputEvent::Scroll(action)),
                    PromptAction::Quit => {
                        self.quit = true;
                        None
                    }
                }
            }
            Event::Paste(text) => {
                self.editor.insert_str(&text);
                None
            }
            _ => None,
        }
    }

    fn render(&mut self, mode: &TuiMode) {
        let status = mode.status_line();
        let lines = mode.transcript_lines();
        let scroll_back = mode.scroll_back();
        let input = self.editor.buffer();
        let cursor = self.editor.cursor();

        let drawn = self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Clear, area);
            let prompt_rows = prompt_visual_rows(input, area.width as usize) as u16;
            let panes = split_chat_layout(area, prompt_rows);

            render_status_line(frame, panes.status, &status);
            render_transcript(frame, panes.transcript, &lines, scroll_back);
            render_prompt(frame, panes.prompt, input, cursor);
        });
        if let Err(error) = drawn {
            tracing::error!(%error, "terminal draw failed");
            self.quit = true;
        }
    }

    fn should_quit(&self) -> bool {
        self.quit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::load()?;
    config.validate()?;
    tracing::info!(
        backend = %config.backend_url,
        local = config.is_local_backend(),
        forward_attachments = config.forward_attachments,
        "finchat starting"
    );

    let (mut runtime, mut ctx) = build_runtime(config)?;
    let mut frontend = ManagedTuiFrontend::new()?;
    runtime.run(&mut frontend, &mut ctx).await;
    drop(frontend);

    tracing::info!("finchat exiting");
    Ok(())
}
