use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::StreamEventsRequest;
use anyhow::Result;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// Replays scripted SSE frames, one script per `stream_events` call, and
/// keeps every request it was asked to serve.
#[derive(Clone, Default)]
pub struct MockAgentBackend {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    requests: Arc<Mutex<Vec<StreamEventsRequest>>>,
}

impl MockAgentBackend {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<StreamEventsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockAgentBackend {
    fn create_mock_stream(&self, request: &StreamEventsRequest) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!(
                "MockAgentBackend: No more responses configured"
            ));
        }
        let frames = responses_guard.remove(0);

        let sse_byte_chunks: Vec<Result<Bytes>> = frames
            .into_iter()
            .map(|s| {
                let framed = if s.ends_with("\n\n") {
                    s
                } else {
                    format!("{s}\n\n")
                };
                Ok(Bytes::from(framed))
            })
            .collect();

        Ok(Box::pin(stream::iter(sse_byte_chunks)))
    }
}

/// Wraps a stream event JSON body in an SSE `data` frame.
pub fn data_frame(event: serde_json::Value) -> String {
    format!("event: data\ndata: {event}")
}

pub fn end_frame() -> String {
    "event: end".to_string()
}
