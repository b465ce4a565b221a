use super::turn::{run_turn, TurnStatus};
use super::UiUpdate;
use crate::api::RemoteAgentClient;
use crate::dispatch::{ChannelSurface, TurnOutcome};
use crate::state::ConversationHistory;
use crate::tools::ToolRegistry;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct ActiveTurn {
    id: u64,
    input: String,
}

/// Owned runtime state handed to every `RuntimeMode` callback: the backend
/// client, the tool registry, conversation history and the channel turns
/// report back on.
pub struct RuntimeContext {
    client: Arc<RemoteAgentClient>,
    registry: Arc<ToolRegistry>,
    history: ConversationHistory,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    cancel_token: CancellationToken,
    active_turn: Option<ActiveTurn>,
    next_turn_id: u64,
}

impl RuntimeContext {
    pub fn new(
        client: RemoteAgentClient,
        registry: ToolRegistry,
        update_tx: mpsc::UnboundedSender<UiUpdate>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            registry: Arc::new(registry),
            history: ConversationHistory::new(),
            update_tx,
            cancel_token: CancellationToken::new(),
            active_turn: None,
            // Turn 0 is reserved for slots the transcript allocates itself.
            next_turn_id: 1,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn backend_url(&self) -> &str {
        self.client.backend_url()
    }

    pub fn active_turn_id(&self) -> Option<u64> {
        self.active_turn.as_ref().map(|turn| turn.id)
    }

    /// Spawns a turn for `input` and returns its id. Everything the turn
    /// produces arrives on the update channel tagged with that id, ending
    /// with exactly one `TurnComplete`, `TurnCancelled` or `Error`.
    pub fn start_turn(&mut self, input: String) -> u64 {
        if let Some(stale) = self.active_turn.take() {
            tracing::warn!(turn = stale.id, "starting a turn while another is active");
            self.cancel_token.cancel();
        }

        let turn_id = self.next_turn_id;
        self.next_turn_id += 1;

        let turn = self.history.next_turn(input.clone());
        self.cancel_token = CancellationToken::new();
        self.active_turn = Some(ActiveTurn { id: turn_id, input });

        let client = Arc::clone(&self.client);
        let registry = Arc::clone(&self.registry);
        let update_tx = self.update_tx.clone();
        let cancel = self.cancel_token.clone();

        tracing::info!(
            turn = turn_id,
            history = turn.chat_history.len(),
            attachment = turn.file.is_some(),
            "turn started"
        );

        tokio::spawn(async move {
            let surface = ChannelSurface::new(turn_id, update_tx.clone());
            let update = match run_turn(&client, &registry, &turn, surface, &cancel).await {
                Ok(report) => match report.status {
                    TurnStatus::Completed => UiUpdate::TurnComplete {
                        turn: turn_id,
                        outcome: report.outcome,
                    },
                    TurnStatus::Cancelled => UiUpdate::TurnCancelled {
                        turn: turn_id,
                        outcome: report.outcome,
                    },
                },
                Err(error) => {
                    tracing::error!(turn = turn_id, error = %format!("{error:#}"), "turn failed");
                    UiUpdate::Error {
                        turn: turn_id,
                        message: format!("{error:#}"),
                    }
                }
            };
            let _ = update_tx.send(update);
        });

        turn_id
    }

    pub fn cancel_turn(&mut self) {
        if let Some(turn) = &self.active_turn {
            tracing::info!(turn = turn.id, "turn cancellation requested");
        }
        self.cancel_token.cancel();
    }

    /// Records the finished exchange in history. Ignored for any turn other
    /// than the active one.
    pub fn complete_turn(&mut self, turn_id: u64, outcome: &TurnOutcome) {
        match self.active_turn.take() {
            Some(turn) if turn.id == turn_id => {
                self.history
                    .record_exchange(turn.input, &outcome.assistant_text);
            }
            other => self.active_turn = other,
        }
    }

    /// Ends the active turn without recording it.
    pub fn abandon_turn(&mut self, turn_id: u64) {
        if self.active_turn_id() == Some(turn_id) {
            self.active_turn = None;
        }
    }

    pub fn stage_attachment(&mut self, path: &Path) -> Result<String> {
        self.history.stage_attachment(path)
    }

    pub fn unstage_attachment(&mut self) -> Option<String> {
        self.history.unstage_attachment()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
