use crate::api::RemoteAgentClient;
use crate::config::Config;
use crate::runtime::context::RuntimeContext;
use crate::runtime::frontend::ScrollAction;
use crate::runtime::mode::RuntimeMode;
use crate::runtime::r#loop::Runtime;
use crate::runtime::UiUpdate;
use crate::state::{SlotId, Transcript, TranscriptLine};
use crate::tools::ToolRegistry;
use anyhow::Result;
use std::path::Path;
use tokio::sync::mpsc;

const HELP_TEXT: &str = "commands: /attach <file>  /detach  /clear  /quit  (Ctrl+C cancels a turn, twice to exit)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LocalCommand<'a> {
    Attach(&'a str),
    Detach,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_local_command(input: &str) -> Option<LocalCommand<'_>> {
    let trimmed = input.trim();
    let rest = trimmed.strip_prefix('/')?;
    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    Some(match name {
        "attach" => LocalCommand::Attach(argument),
        "detach" => LocalCommand::Detach,
        "clear" => LocalCommand::Clear,
        "help" => LocalCommand::Help,
        "quit" | "exit" => LocalCommand::Quit,
        _ => LocalCommand::Unknown(name),
    })
}

struct ViewState {
    /// Rows scrolled up from the bottom; zero while following.
    scroll_back: usize,
    auto_follow: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scroll_back: 0,
            auto_follow: true,
        }
    }
}

pub struct TuiMode {
    transcript: Transcript,
    view: ViewState,
    active_turn: Option<u64>,
    cancel_pending: bool,
    staged_attachment: Option<String>,
    backend_label: String,
    history_line_cap: usize,
    pending_quit: bool,
    quit_requested: bool,
}

impl TuiMode {
    pub fn new(config: &Config) -> Self {
        Self {
            transcript: Transcript::new(),
            view: ViewState::default(),
            active_turn: None,
            cancel_pending: false,
            staged_attachment: None,
            backend_label: backend_label(&config.backend_url),
            history_line_cap: config.max_history_lines,
            pending_quit: false,
            quit_requested: false,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_lines(&self) -> Vec<TranscriptLine> {
        self.transcript.lines()
    }

    pub fn scroll_back(&self) -> usize {
        self.view.scroll_back
    }

    fn mode_label(&self) -> &'static str {
        if self.pending_quit {
            "quit-arm"
        } else if self.cancel_pending {
            "cancelling"
        } else if self.active_turn.is_some() {
            "streaming"
        } else {
            "ready"
        }
    }

    pub fn status_line(&self) -> String {
        let view = if self.view.auto_follow {
            "following"
        } else {
            "scrolled"
        };
        let mut status = format!(
            "finchat mode:{} backend:{} view:{}",
            self.mode_label(),
            self.backend_label,
            view
        );
        if let Some(label) = &self.staged_attachment {
            status.push_str(&format!(" attach:{label}"));
        }
        status
    }

    fn push_notice(&mut self, text: impl Into<String>) {
        self.transcript.push_notice(text);
        self.after_transcript_change();
    }

    fn push_error(&mut self, text: impl Into<String>) {
        self.transcript.push_error(text);
        self.after_transcript_change();
    }

    fn after_transcript_change(&mut self) {
        let dropped = self.transcript.enforce_line_cap(self.history_line_cap, self.active_turn);
        if dropped > 0 {
            tracing::debug!(dropped, "transcript trimmed to line cap");
        }
        if self.view.auto_follow {
            self.view.scroll_back = 0;
        } else {
            self.clamp_scroll();
        }
    }

    fn max_scroll_back(&self) -> usize {
        self.transcript.lines().len().saturating_sub(1)
    }

    fn clamp_scroll(&mut self) {
        self.view.scroll_back = self.view.scroll_back.min(self.max_scroll_back());
    }

    fn scroll_up(&mut self, rows: usize) {
        self.view.scroll_back = self
            .view
            .scroll_back
            .saturating_add(rows.max(1))
            .min(self.max_scroll_back());
        self.view.auto_follow = self.view.scroll_back == 0;
    }

    fn scroll_down(&mut self, rows: usize) {
        self.view.scroll_back = self.view.scroll_back.saturating_sub(rows.max(1));
        self.view.auto_follow = self.view.scroll_back == 0;
    }

    /// Whether an update for `slot` should reach the transcript. Updates for
    /// anything but the active turn, or for a turn being cancelled, are
    /// dropped.
    fn accepts(&self, slot: SlotId) -> bool {
        !self.cancel_pending && self.active_turn == Some(slot.turn)
    }

    fn end_turn(&mut self, turn: u64) -> bool {
        if self.active_turn != Some(turn) {
            tracing::debug!(turn, "update for an inactive turn dropped");
            return false;
        }
        self.transcript.settle_turn(turn);
        self.active_turn = None;
        self.cancel_pending = false;
        true
    }

    fn handle_local_command(&mut self, command: LocalCommand<'_>, ctx: &mut RuntimeContext) {
        match command {
            LocalCommand::Attach("") => self.push_notice("[usage: /attach <file>]"),
            LocalCommand::Attach(path) => match ctx.stage_attachment(Path::new(path)) {
                Ok(label) => {
                    self.push_notice(format!("[attached {label}; sent with the next message]"));
                    self.staged_attachment = Some(label);
                }
                Err(error) => self.push_error(format!("{error:#}")),
            },
            LocalCommand::Detach => match ctx.unstage_attachment() {
                Some(label) => {
                    self.staged_attachment = None;
                    self.push_notice(format!("[detached {label}]"));
                }
                None => self.push_notice("[no attachment staged]"),
            },
            LocalCommand::Clear => {
                if self.active_turn.is_some() {
                    self.push_notice("[busy - cannot clear while a turn is in progress]");
                    return;
                }
                ctx.clear_history();
                self.transcript.clear();
                self.staged_attachment = None;
                self.view = ViewState::default();
                self.push_notice("[conversation cleared]");
            }
            LocalCommand::Help => self.push_notice(HELP_TEXT),
            LocalCommand::Quit => {
                if self.active_turn.is_some() {
                    ctx.cancel_turn();
                }
                self.quit_requested = true;
            }
            LocalCommand::Unknown(name) => {
                self.push_notice(format!("[unknown command: /{name}] {HELP_TEXT}"))
            }
        }
    }
}

impl RuntimeMode for TuiMode {
    fn on_user_input(&mut self, input: String, ctx: &mut RuntimeContext) {
        if let Some(command) = parse_local_command(&input) {
            self.pending_quit = false;
            self.handle_local_command(command, ctx);
            return;
        }

        if self.active_turn.is_some() {
            if self.cancel_pending {
                self.push_notice("[busy - cancelling current turn, input discarded]");
            } else {
                self.push_notice("[busy - turn in progress, input discarded]");
            }
            return;
        }

        self.pending_quit = false;
        self.quit_requested = false;
        self.transcript.push_user(input.clone());
        self.staged_attachment = None;
        self.view.auto_follow = true;
        self.after_transcript_change();
        self.active_turn = Some(ctx.start_turn(input));
    }

    fn on_model_update(&mut self, update: UiUpdate, ctx: &mut RuntimeContext) {
        match update {
            UiUpdate::Mount { slot, element } => {
                if self.accepts(slot) {
                    self.transcript.mount_at(slot, element);
                }
            }
            UiUpdate::AppendText { slot, text } => {
                if self.accepts(slot) {
                    self.transcript.append_text_at(slot, &text);
                }
            }
            UiUpdate::Finalize { slot, element } => {
                if self.accepts(slot) {
                    self.transcript.finalize_at(slot, element);
                }
            }
            UiUpdate::TurnComplete { turn, outcome } => {
                if self.end_turn(turn) {
                    ctx.complete_turn(turn, &outcome);
                    if outcome.assistant_text.is_empty() && outcome.selected_tool.is_none() {
                        self.transcript.push_notice("[agent returned no output]");
                    }
                }
            }
            UiUpdate::TurnCancelled { turn, .. } => {
                if self.end_turn(turn) {
                    ctx.abandon_turn(turn);
                    self.transcript.push_notice("[turn cancelled]");
                }
            }
            UiUpdate::Error { turn, message } => {
                if self.end_turn(turn) {
                    ctx.abandon_turn(turn);
                    self.transcript.push_error(message);
                }
            }
        }
        self.after_transcript_change();
    }

    fn on_interrupt(&mut self, ctx: &mut RuntimeContext) {
        if self.active_turn.is_some() {
            if self.cancel_pending {
                return;
            }
            ctx.cancel_turn();
            self.cancel_pending = true;
            self.pending_quit = false;
            self.quit_requested = false;
            self.push_notice("[turn cancellation requested]");
            return;
        }

        if self.pending_quit {
            self.quit_requested = true;
        } else {
            self.pending_quit = true;
            self.push_notice("[press Ctrl+C again to exit]");
        }
    }

    fn on_scroll(&mut self, action: ScrollAction) {
        match action {
            ScrollAction::LineUp => self.scroll_up(1),
            ScrollAction::LineDown => self.scroll_down(1),
            ScrollAction::PageUp(rows) => self.scroll_up(rows),
            ScrollAction::PageDown(rows) => self.scroll_down(rows),
            ScrollAction::Home => {
                self.view.scroll_back = self.max_scroll_back();
                self.view.auto_follow = self.view.scroll_back == 0;
            }
            ScrollAction::End => self.view = ViewState::default(),
        }
    }

    fn is_turn_in_progress(&self) -> bool {
        self.active_turn.is_some()
    }
}

fn backend_label(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let host = parsed.host_str()?.to_string();
            Some(match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            })
        })
        .unwrap_or_else(|| url.to_string())
}

pub fn build_runtime(config: Config) -> Result<(Runtime<TuiMode>, RuntimeContext)> {
    let client = RemoteAgentClient::new(&config)?;
    let registry = ToolRegistry::with_builtin_tools();
    tracing::info!(
        backend = %client.backend_url(),
        tools = ?registry.tool_ids().collect::<Vec<_>>(),
        "runtime ready"
    );

    let (update_tx, update_rx) = mpsc::unbounded_channel::<UiUpdate>();
    let ctx = RuntimeContext::new(client, registry, update_tx);

    let mode = TuiMode::new(&config);
    let runtime = Runtime::new(mode, update_rx);
    Ok((runtime, ctx))
}
