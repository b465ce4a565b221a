use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const INVOKE_MODEL_STEP: &str = "invoke_model";
pub const INVOKE_TOOLS_STEP: &str = "invoke_tools";
pub const CHAT_MODEL_STREAM_EVENT: &str = "on_chat_model_stream";

/// A stream event exactly as the remote runnable emits it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStreamEvent {
    pub event: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Start,
    Stream,
    End,
    Other,
}

impl LifecyclePhase {
    /// The phase is the last `_`-separated segment of the event name
    /// (`on_chain_end` -> `End`).
    pub fn of(event_name: &str) -> Self {
        match event_name.rsplit('_').next() {
            Some("start") => Self::Start,
            Some("stream") => Self::Stream,
            Some("end") => Self::End,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCall {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub id: Option<String>,
}

/// Stream events after the boundary decode. Anything the dispatcher has no
/// use for collapses into `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ModelEnd {
        run_id: String,
        tool_calls: Vec<ToolCall>,
    },
    ToolsEnd {
        run_id: String,
        tool_result: Value,
    },
    ChatModelStream {
        run_id: String,
        text: String,
    },
    Other {
        event: String,
        name: String,
    },
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("{event} event for step '{name}' has no object output")]
    MissingOutput { event: String, name: String },
    #[error("chat model stream event for run '{run_id}' has no chunk object")]
    MissingChunk { run_id: String },
    #[error("tool calls on run '{run_id}' are malformed: {source}")]
    MalformedToolCalls {
        run_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AgentEvent {
    pub fn decode(raw: RawStreamEvent) -> Result<Self, EventDecodeError> {
        let RawStreamEvent {
            event,
            name,
            run_id,
            data,
            ..
        } = raw;

        if event == CHAT_MODEL_STREAM_EVENT {
            let Some(chunk) = data.get("chunk").and_then(Value::as_object) else {
                return Err(EventDecodeError::MissingChunk { run_id });
            };
            let text = chunk_text(chunk);
            return Ok(Self::ChatModelStream { run_id, text });
        }

        let is_dispatch_step = name == INVOKE_MODEL_STEP || name == INVOKE_TOOLS_STEP;
        if LifecyclePhase::of(&event) != LifecyclePhase::End || !is_dispatch_step {
            return Ok(Self::Other { event, name });
        }

        let Some(output) = data.get("output").and_then(Value::as_object) else {
            return Err(EventDecodeError::MissingOutput { event, name });
        };

        if name == INVOKE_MODEL_STEP {
            let tool_calls = match output.get("tool_calls") {
                None | Some(Value::Null) => Vec::new(),
                Some(calls) => decode_tool_calls(&run_id, calls)?,
            };
            Ok(Self::ModelEnd { run_id, tool_calls })
        } else {
            let tool_result = output.get("tool_result").cloned().unwrap_or(Value::Null);
            Ok(Self::ToolsEnd {
                run_id,
                tool_result,
            })
        }
    }
}

/// The first call decides which tool view is mounted, so it must decode.
/// Later calls are never mounted; a malformed one is logged and dropped.
fn decode_tool_calls(run_id: &str, calls: &Value) -> Result<Vec<ToolCall>, EventDecodeError> {
    let malformed = |source| EventDecodeError::MalformedToolCalls {
        run_id: run_id.to_string(),
        source,
    };
    let elements: Vec<Value> = serde_json::from_value(calls.clone()).map_err(malformed)?;

    let mut decoded = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<ToolCall>(element) {
            Ok(call) => decoded.push(call),
            Err(source) if index == 0 => return Err(malformed(source)),
            Err(error) => {
                tracing::debug!(run_id, index, %error, "dropping malformed trailing tool call");
            }
        }
    }
    Ok(decoded)
}

/// Chunk content is either a plain string or a list of content parts.
fn chunk_text(chunk: &Map<String, Value>) -> String {
    match chunk.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(fields) => fields.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect(),
        _ => String::new(),
    }
}
