use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::types::{StreamEventsRequest, TurnInput};
use crate::util::{is_local_endpoint_url, join_endpoint};
use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

const STREAM_EVENTS_ENDPOINT: &str = "stream_events";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, request: &StreamEventsRequest) -> Result<ByteStream>;
}

/// HTTP client for a LangServe-style remote runnable.
#[derive(Clone)]
pub struct RemoteAgentClient {
    http: reqwest::Client,
    backend_url: String,
    forward_attachments: bool,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl RemoteAgentClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            backend_url: config.backend_url.clone(),
            forward_attachments: config.forward_attachments,
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend_url: crate::config::DEFAULT_BACKEND_URL.to_string(),
            forward_attachments: false,
            mock_stream_producer: Some(mock_producer),
        }
    }

    #[cfg(test)]
    pub fn with_forward_attachments(mut self, enabled: bool) -> Self {
        self.forward_attachments = enabled;
        self
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn stream_events_url(&self) -> String {
        join_endpoint(&self.backend_url, STREAM_EVENTS_ENDPOINT)
    }

    /// Opens the event stream for one turn. The returned stream yields raw SSE
    /// bytes; decoding is left to `StreamParser`.
    pub async fn stream_events(&self, turn: &TurnInput) -> Result<ByteStream> {
        let request = StreamEventsRequest::from_turn(turn, self.forward_attachments);

        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(&request);
            }
        }

        let request_url = self.stream_events_url();
        if debug_payload_enabled() {
            let payload = serde_json::to_value(&request)?;
            emit_debug_payload(&request_url, &payload);
        }

        tracing::debug!(
            url = %request_url,
            history = turn.chat_history.len(),
            attachment = turn.file.is_some(),
            "opening remote event stream"
        );

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, &request_url))?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local agent backend '{}': {}. Start the backend or update FINCHAT_BACKEND_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach agent backend '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "agent backend '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("request to '{}' failed: {}", request_url, error)
}
