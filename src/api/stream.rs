use super::logging::emit_sse_parse_error;
use crate::types::RawStreamEvent;
use anyhow::Result;
use serde_json::Value;

/// One server-sent frame of a `stream_events` response.
#[derive(Debug, Clone)]
pub enum StreamFrame {
    Event(RawStreamEvent),
    End,
    Error(String),
}

/// Incremental SSE decoder. Bytes are buffered until a blank line closes a
/// frame, so events split across network chunks decode once complete.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<StreamFrame>> {
        self.buffer.extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));
        let mut frames = Vec::new();
        let mut start = 0;

        while let Some(end) = find_frame_end(&self.buffer[start..]) {
            let frame_end = start + end + 2;
            let frame_text = String::from_utf8_lossy(&self.buffer[start..frame_end]).into_owned();
            start = frame_end;

            if let Some(frame) = parse_frame(&frame_text) {
                frames.push(frame);
            }
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(frames)
    }

    pub fn flush(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned()
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

fn parse_frame(frame_text: &str) -> Option<StreamFrame> {
    let mut event_type: Option<&str> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in frame_text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    let data = data_lines.join("\n");
    match event_type.unwrap_or("data") {
        "end" => Some(StreamFrame::End),
        "error" => Some(StreamFrame::Error(error_message(&data))),
        "data" => {
            if data.trim().is_empty() {
                return None;
            }
            match serde_json::from_str::<RawStreamEvent>(&data) {
                Ok(event) => Some(StreamFrame::Event(event)),
                Err(error) => {
                    emit_sse_parse_error(event_type, &data, &error);
                    None
                }
            }
        }
        _ => None,
    }
}

fn error_message(data: &str) -> String {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return "remote agent reported an error".to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(body) => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(trimmed)
                .to_string();
            match body.get("status_code").and_then(Value::as_u64) {
                Some(status) => format!("{message} (status {status})"),
                None => message,
            }
        }
        Err(_) => trimmed.to_string(),
    }
}
