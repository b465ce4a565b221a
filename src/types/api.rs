use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Human,
    Ai,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub base64: String,
    pub extension: String,
}

/// One submitted turn. Never mutated after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInput {
    pub input: String,
    pub chat_history: Vec<ChatMessage>,
    pub file: Option<FileAttachment>,
}

impl TurnInput {
    pub fn new(input: impl Into<String>, chat_history: Vec<ChatMessage>) -> Self {
        Self {
            input: input.into(),
            chat_history,
            file: None,
        }
    }

    pub fn with_file(mut self, file: Option<FileAttachment>) -> Self {
        self.file = file;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInput {
    pub input: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
}

/// Body of a `stream_events` call against a remote runnable.
#[derive(Debug, Clone, Serialize)]
pub struct StreamEventsRequest {
    pub input: AgentInput,
    pub config: Map<String, Value>,
    pub kwargs: Map<String, Value>,
}

impl StreamEventsRequest {
    pub fn from_turn(turn: &TurnInput, forward_attachment: bool) -> Self {
        let mut messages = Vec::with_capacity(turn.chat_history.len() + 1);
        messages.extend(turn.chat_history.iter().cloned());
        messages.push(ChatMessage::new(ChatRole::Human, turn.input.clone()));

        let file = if forward_attachment {
            turn.file.clone()
        } else {
            None
        };

        Self {
            input: AgentInput {
                input: messages,
                file,
            },
            config: Map::new(),
            kwargs: Map::new(),
        }
    }
}
