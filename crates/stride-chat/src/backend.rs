use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde_json::Value;
use stride_core::config::ClientConfig;
use stride_core::types::ChatRequest;
use tracing::{debug, warn};

use crate::error::ChatError;

/// Response body of the streaming endpoint, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ChatError>>;

/// Transport to the coach. One implementation talks HTTP; tests script it.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Send `message` and wait for the full answer, already normalized
    /// for display.
    async fn send_message(&self, message: &str) -> Result<String, ChatError>;

    /// Send `message` and return the response body as a byte stream.
    /// Fails before any byte is read if the server rejects the request.
    async fn open_stream(&self, message: &str) -> Result<ByteStream, ChatError>;
}

/// `reqwest` client for `POST /coach/message` and `POST /coach/stream`.
pub struct HttpBackend {
    client: reqwest::Client,
    message_url: String,
    stream_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            message_url: config.message_url(),
            stream_url: config.stream_url(),
        })
    }

    async fn post(
        &self,
        url: &str,
        message: &str,
        accept: &str,
    ) -> Result<reqwest::Response, ChatError> {
        let resp = self
            .client
            .post(url)
            .header("accept", accept)
            .json(&ChatRequest::new(message))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, url, "coach API error");
            return Err(ChatError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn send_message(&self, message: &str) -> Result<String, ChatError> {
        debug!(url = %self.message_url, "sending one-shot chat request");
        let resp = self.post(&self.message_url, message, "application/json").await?;
        let raw = resp.text().await?;
        Ok(normalize_answer(&raw))
    }

    async fn open_stream(&self, message: &str) -> Result<ByteStream, ChatError> {
        debug!(url = %self.stream_url, "opening chat stream");
        let resp = self.post(&self.stream_url, message, "text/event-stream").await?;
        let body = resp.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| ChatError::Read(e.to_string()))
        });
        Ok(body.boxed())
    }
}

/// Turn a one-shot response body into display text.
///
/// A JSON string is unwrapped, any other JSON value is pretty-printed with a
/// two-space indent, and anything that is not JSON is shown as-is.
pub fn normalize_answer(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(text)) => text,
        Ok(other) => serde_json::to_string_pretty(&other).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}
