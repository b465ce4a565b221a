use finchat::api::stream::{StreamFrame, StreamParser};
use finchat::dispatch::{DispatchError, EventDispatcher, TurnOutcome};
use finchat::state::{LineKind, Transcript};
use finchat::tools::{ToolRegistry, ToolView};
use finchat::types::AgentEvent;
use serde_json::{json, Value};

fn sse(events: &[Value]) -> String {
    let mut body: String = events
        .iter()
        .map(|event| format!("event: data\ndata: {event}\n\n"))
        .collect();
    body.push_str("event: end\n\n");
    body
}

/// Feeds an SSE body through the parser in small chunks and dispatches every
/// decodable event, the same path a live turn takes.
fn replay(
    body: &str,
    registry: &ToolRegistry,
    transcript: &mut Transcript,
    chunk_size: usize,
) -> Result<TurnOutcome, DispatchError> {
    let mut parser = StreamParser::new();
    let mut dispatcher = EventDispatcher::new(registry, transcript);

    'chunks: for chunk in body.as_bytes().chunks(chunk_size) {
        for frame in parser.process(chunk).expect("parser never fails") {
            match frame {
                StreamFrame::Event(raw) => {
                    if let Ok(event) = AgentEvent::decode(raw) {
                        dispatcher.dispatch(event)?;
                    }
                }
                StreamFrame::End => break 'chunks,
                StreamFrame::Error(message) => panic!("unexpected error frame: {message}"),
            }
        }
    }
    Ok(dispatcher.finish())
}

fn price_turn() -> String {
    sse(&[
        json!({"event": "on_chain_start", "name": "agent", "run_id": "a1", "data": {}}),
        json!({
            "event": "on_chain_end",
            "name": "invoke_model",
            "run_id": "m1",
            "data": {"output": {"tool_calls": [{"type": "get-prices", "args": {"ticker": "AAPL"}}]}}
        }),
        json!({"event": "on_chat_model_stream", "name": "ChatOpenAI", "run_id": "r1", "data": {"chunk": {"content": "Here"}}}),
        json!({"event": "on_chat_model_stream", "name": "ChatOpenAI", "run_id": "r1", "data": {"chunk": {"content": " you go"}}}),
        json!({
            "event": "on_chain_end",
            "name": "invoke_tools",
            "run_id": "t1",
            "data": {"output": {"tool_result": {
                "ticker": "AAPL",
                "prices": [
                    {"time": "2024-05-01T00:00:00Z", "open": 169.5, "high": 172.7, "low": 169.1, "close": 169.3, "volume": 50383147},
                    {"time": "2024-05-02T00:00:00Z", "open": 172.5, "high": 173.4, "low": 170.9, "close": 173.0, "volume": 94214915}
                ]
            }}}
        }),
    ])
}

#[test]
fn test_price_turn_renders_bubble_and_final_chart() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();

    let outcome = replay(&price_turn(), &registry, &mut transcript, 17).expect("dispatches");

    assert_eq!(outcome.assistant_text, "Here you go");
    assert_eq!(outcome.selected_tool.as_deref(), Some("get-prices"));
    assert!(outcome.tool_finalized);

    let views: Vec<&ToolView> = transcript.tool_views().collect();
    assert_eq!(views.len(), 1);
    match views[0] {
        ToolView::Prices(chart) => {
            assert_eq!(chart.ticker, "AAPL");
            assert_eq!(chart.prices.len(), 2);
        }
        other => panic!("unexpected view: {other:?}"),
    }

    let lines = transcript.lines();
    assert!(lines.iter().all(|line| line.kind != LineKind::ToolPending));
    assert!(lines
        .iter()
        .any(|line| line.kind == LineKind::Assistant && line.text == "Here you go"));
}

#[test]
fn test_chunking_does_not_change_the_result() {
    let registry = ToolRegistry::with_builtin_tools();
    let body = price_turn();

    let mut whole = Transcript::new();
    let mut bytewise = Transcript::new();
    let expected = replay(&body, &registry, &mut whole, body.len()).expect("dispatches");
    let actual = replay(&body, &registry, &mut bytewise, 1).expect("dispatches");

    assert_eq!(expected, actual);
    assert_eq!(whole.lines(), bytewise.lines());
}

#[test]
fn test_line_items_turn_with_list_content_chunks() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let body = sse(&[
        json!({
            "event": "on_chain_end",
            "name": "invoke_model",
            "run_id": "m1",
            "data": {"output": {"tool_calls": [{"type": "search-line-items", "args": {"tickers": ["MSFT"]}}]}}
        }),
        json!({
            "event": "on_chat_model_stream",
            "name": "ChatAnthropic",
            "run_id": "r1",
            "data": {"chunk": {"content": [{"type": "text", "text": "Revenue "}, {"type": "text", "text": "rose."}]}}
        }),
        json!({
            "event": "on_chain_end",
            "name": "invoke_tools",
            "run_id": "t1",
            "data": {"output": {"tool_result": {"search_results": [
                {"ticker": "MSFT", "report_period": "2024-03-31", "period": "quarterly", "currency": "USD", "revenue": 61858000000.0}
            ]}}}
        }),
    ]);

    let outcome = replay(&body, &registry, &mut transcript, 64).expect("dispatches");
    assert_eq!(outcome.assistant_text, "Revenue rose.");
    assert!(matches!(
        transcript.tool_views().next(),
        Some(ToolView::LineItems(table)) if table.rows.len() == 1
    ));
}

#[test]
fn test_unregistered_tool_surfaces_drift_error() {
    let registry = ToolRegistry::with_builtin_tools();
    let mut transcript = Transcript::new();
    let body = sse(&[json!({
        "event": "on_chain_end",
        "name": "invoke_model",
        "run_id": "m1",
        "data": {"output": {"tool_calls": [{"type": "get-financials", "args": {}}]}}
    })]);

    let error = replay(&body, &registry, &mut transcript, 32).unwrap_err();
    assert!(error.to_string().contains("get-financials"));
    assert!(transcript.is_empty());
}
