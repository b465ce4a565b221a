use super::*;
use crate::state::{Transcript, UiElement};
use crate::tools::{ToolRegistry, ToolView, GET_PRICES, SEARCH_WEB};
use crate::types::{AgentEvent, RawStreamEvent};
use serde_json::{json, Value};

fn model_end(tool_kinds: &[&str]) -> Value {
    let calls: Vec<Value> = tool_kinds
        .iter()
        .map(|kind| json!({"type": kind, "args": {}}))
        .collect();
    json!({
        "event": "on_chain_end",
        "name": "invoke_model",
        "run_id": "model-run",
        "data": {"output": {"tool_calls": calls}}
    })
}

fn tools_end(result: Value) -> Value {
    json!({
        "event": "on_chain_end",
        "name": "invoke_tools",
        "run_id": "tools-run",
        "data": {"output": {"tool_result": result}}
    })
}

fn chat_stream(run_id: &str, content: &str) -> Value {
    json!({
        "event": "on_chat_model_stream",
        "name": "ChatOpenAI",
        "run_id": run_id,
        "data": {"chunk": {"content": content}}
    })
}

fn prices_result() -> Value {
    json!({
        "ticker": "AAPL",
        "prices": [
            {"time": "2024-05-01", "close": 170.0},
            {"time": "2024-05-02", "close": 173.5}
        ]
    })
}

/// Decodes and dispatches each event the way the turn runner does: events
/// that fail to decode are skipped.
fn run_events<S: UiSurface>(
    dispatcher: &mut EventDispatcher<'_, S>,
    events: Vec<Value>,
) -> Result<(), DispatchError> {
    for value in events {
        let raw: RawStreamEvent = serde_json::from_value(value).expect("raw event");
        if let Ok(event) = AgentEvent::decode(raw) {
            dispatcher.dispatch(event)?;
        }
    }
    Ok(())
}

#[test]
fn test_tool_call_then_result_leaves_one_final_view() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![model_end(&[GET_PRICES]), tools_end(prices_result())],
    )
    .unwrap();
    let outcome = dispatcher.finish();

    let views: Vec<&ToolView> = transcript.tool_views().collect();
    assert_eq!(views.len(), 1);
    assert!(matches!(views[0], ToolView::Prices(chart) if chart.ticker == "AAPL"));
    assert_eq!(outcome.selected_tool.as_deref(), Some(GET_PRICES));
    assert!(outcome.tool_finalized);
}

#[test]
fn test_only_first_tool_call_mounts_a_view() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![
            model_end(&[GET_PRICES, SEARCH_WEB]),
            model_end(&[SEARCH_WEB]),
        ],
    )
    .unwrap();
    assert_eq!(dispatcher.ledger().selected_tool().unwrap().kind, GET_PRICES);
    dispatcher.finish();

    let views: Vec<&ToolView> = transcript.tool_views().collect();
    assert_eq!(
        views,
        vec![&ToolView::Loading {
            title: "Price chart"
        }]
    );
}

#[test]
fn test_first_tool_call_mounts_despite_malformed_later_call() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    let event = json!({
        "event": "on_chain_end",
        "name": "invoke_model",
        "run_id": "model-run",
        "data": {"output": {"tool_calls": [
            {"type": GET_PRICES, "args": {"ticker": "AAPL"}},
            {"name": SEARCH_WEB, "args": {}}
        ]}}
    });
    run_events(&mut dispatcher, vec![event]).unwrap();

    assert_eq!(dispatcher.ledger().selected_tool().unwrap().kind, GET_PRICES);
    dispatcher.finish();
    assert_eq!(transcript.tool_views().count(), 1);
}

#[test]
fn test_chunks_on_one_run_share_one_sink() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    let chunks = ["The ", "quarter ", "looked ", "strong."];
    run_events(
        &mut dispatcher,
        chunks.iter().map(|chunk| chat_stream("r1", chunk)).collect(),
    )
    .unwrap();

    assert_eq!(dispatcher.ledger().sink_count(), 1);
    let outcome = dispatcher.finish();
    assert_eq!(outcome.assistant_text, "The quarter looked strong.");
    assert_eq!(
        transcript.ai_messages().collect::<Vec<_>>(),
        vec!["The quarter looked strong."]
    );
}

#[test]
fn test_distinct_runs_get_independent_sinks() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![
            chat_stream("r1", "Looking "),
            chat_stream("r2", "Revenue "),
            chat_stream("r1", "it up."),
            chat_stream("r2", "grew."),
        ],
    )
    .unwrap();

    let sinks: Vec<(&str, &str)> = dispatcher
        .ledger()
        .sinks()
        .map(|(run_id, sink)| (run_id, sink.content()))
        .collect();
    assert_eq!(sinks, vec![("r1", "Looking it up."), ("r2", "Revenue grew.")]);
    dispatcher.finish();

    assert_eq!(
        transcript.ai_messages().collect::<Vec<_>>(),
        vec!["Looking it up.", "Revenue grew."]
    );
}

#[test]
fn test_text_and_tool_interleave_into_bubble_and_chart() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![
            model_end(&[GET_PRICES]),
            chat_stream("r1", "Here"),
            chat_stream("r1", " you go"),
            tools_end(prices_result()),
        ],
    )
    .unwrap();
    dispatcher.finish();

    assert_eq!(transcript.ai_messages().collect::<Vec<_>>(), vec!["Here you go"]);
    let views: Vec<&ToolView> = transcript.tool_views().collect();
    assert_eq!(views.len(), 1);
    assert!(!views[0].is_loading());
}

#[test]
fn test_stream_event_without_chunk_is_skipped() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![json!({
            "event": "on_chat_model_stream",
            "name": "ChatOpenAI",
            "run_id": "r1",
            "data": {}
        })],
    )
    .unwrap();

    assert_eq!(dispatcher.ledger().sink_count(), 0);
    dispatcher.finish();
    assert!(transcript.is_empty());
}

#[test]
fn test_unknown_tool_is_a_dispatch_error() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    let error = run_events(&mut dispatcher, vec![model_end(&["get-financials"])]).unwrap_err();
    assert!(matches!(&error, DispatchError::UnknownTool(kind) if kind == "get-financials"));
    assert!(!dispatcher.ledger().has_selected_tool());
    dispatcher.finish();
    assert!(transcript.is_empty());
}

#[test]
fn test_tool_result_without_placeholder_is_ignored() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(&mut dispatcher, vec![tools_end(prices_result())]).unwrap();
    let outcome = dispatcher.finish();

    assert!(transcript.is_empty());
    assert_eq!(outcome, TurnOutcome::default());
}

#[test]
fn test_second_tool_result_does_not_replace_final_view() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![
            model_end(&[GET_PRICES]),
            tools_end(prices_result()),
            tools_end(json!({"ticker": "MSFT", "prices": []})),
        ],
    )
    .unwrap();
    dispatcher.finish();

    let views: Vec<&ToolView> = transcript.tool_views().collect();
    assert!(matches!(views[0], ToolView::Prices(chart) if chart.ticker == "AAPL"));
}

#[test]
fn test_truncated_stream_leaves_placeholder_loading() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(&mut dispatcher, vec![model_end(&[SEARCH_WEB])]).unwrap();
    let outcome = dispatcher.finish();

    assert!(!outcome.tool_finalized);
    assert!(matches!(
        transcript.entries().last(),
        Some(crate::state::TranscriptEntry::Element { element, .. })
            if element == &UiElement::Tool(ToolView::Loading { title: "Web search" })
    ));
}

#[test]
fn test_outcome_joins_runs_and_skips_empty_sinks() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let mut dispatcher = EventDispatcher::new(&registry, &mut transcript);

    run_events(
        &mut dispatcher,
        vec![
            chat_stream("r1", "First."),
            chat_stream("r2", ""),
            chat_stream("r3", "Second."),
        ],
    )
    .unwrap();

    assert_eq!(dispatcher.ledger().sink_count(), 3);
    assert_eq!(dispatcher.finish().assistant_text, "First.\n\nSecond.");
}
