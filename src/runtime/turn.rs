use crate::api::logging::emit_event_skipped;
use crate::api::stream::{StreamFrame, StreamParser};
use crate::api::RemoteAgentClient;
use crate::dispatch::{EventDispatcher, TurnOutcome, UiSurface};
use crate::tools::ToolRegistry;
use crate::types::{AgentEvent, TurnInput};
use anyhow::{bail, Result};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub status: TurnStatus,
    pub outcome: TurnOutcome,
}

/// Streams one turn from the remote agent and feeds every decoded event to a
/// fresh dispatcher, in arrival order.
///
/// Cancellation stops reading immediately; whatever the surface already shows
/// stays as it is. A stream that closes without an `end` frame still counts as
/// completed.
pub async fn run_turn<S: UiSurface>(
    client: &RemoteAgentClient,
    registry: &ToolRegistry,
    turn: &TurnInput,
    surface: S,
    cancel: &CancellationToken,
) -> Result<TurnReport> {
    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Ok(TurnReport {
                status: TurnStatus::Cancelled,
                outcome: TurnOutcome::default(),
            });
        }
        opened = client.stream_events(turn) => opened?,
    };

    let mut parser = StreamParser::new();
    let mut dispatcher = EventDispatcher::new(registry, surface);
    let mut events = 0usize;

    let status = 'stream: loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break 'stream TurnStatus::Cancelled,
            next = stream.next() => next,
        };

        let Some(chunk) = next else {
            let trailing = parser.flush();
            if !trailing.trim().is_empty() {
                tracing::warn!(bytes = trailing.len(), "event stream closed mid-frame");
            } else {
                tracing::debug!("event stream closed without an end frame");
            }
            break 'stream TurnStatus::Completed;
        };

        for frame in parser.process(&chunk?)? {
            match frame {
                StreamFrame::Event(raw) => {
                    events += 1;
                    match AgentEvent::decode(raw) {
                        Ok(event) => dispatcher.dispatch(event)?,
                        Err(error) => emit_event_skipped(&error),
                    }
                }
                StreamFrame::End => break 'stream TurnStatus::Completed,
                StreamFrame::Error(message) => bail!("remote agent failed: {message}"),
            }
        }
    };

    let outcome = dispatcher.finish();
    tracing::info!(
        ?status,
        events,
        tool = outcome.selected_tool.as_deref().unwrap_or("none"),
        tool_finalized = outcome.tool_finalized,
        "turn finished"
    );
    Ok(TurnReport { status, outcome })
}
