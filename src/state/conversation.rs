use crate::types::{ChatMessage, ChatRole, FileAttachment, TurnInput};
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// Prior turns sent with every request, plus an attachment staged for the
/// next submission.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    staged_attachment: Option<(String, FileAttachment)>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Builds the next turn from the current history. A staged attachment is
    /// consumed by the turn it is sent with.
    pub fn next_turn(&mut self, input: impl Into<String>) -> TurnInput {
        let file = self.staged_attachment.take().map(|(_, file)| file);
        TurnInput::new(input, self.messages.clone()).with_file(file)
    }

    /// Records a completed exchange. An empty reply (tool-only turn) records
    /// just the human message.
    pub fn record_exchange(&mut self, input: impl Into<String>, reply: &str) {
        self.messages.push(ChatMessage::new(ChatRole::Human, input));
        if !reply.trim().is_empty() {
            self.messages.push(ChatMessage::new(ChatRole::Ai, reply));
        }
    }

    pub fn stage_attachment(&mut self, path: &Path) -> Result<String> {
        let attachment = encode_attachment(path)?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.staged_attachment = Some((label.clone(), attachment));
        Ok(label)
    }

    pub fn unstage_attachment(&mut self) -> Option<String> {
        self.staged_attachment.take().map(|(label, _)| label)
    }

    #[cfg(test)]
    pub fn staged_attachment_label(&self) -> Option<&str> {
        self.staged_attachment
            .as_ref()
            .map(|(label, _)| label.as_str())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.staged_attachment = None;
    }
}

pub fn encode_attachment(path: &Path) -> Result<FileAttachment> {
    let Some(extension) = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
    else {
        bail!(
            "cannot attach '{}': file has no extension to tag its type",
            path.display()
        );
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("cannot read attachment '{}'", path.display()))?;

    Ok(FileAttachment {
        base64: STANDARD.encode(bytes),
        extension,
    })
}
