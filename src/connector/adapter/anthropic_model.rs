use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::application::{LanguageModel, ReplyStream};
use crate::domain::DomainError;

/// Default target: LM Studio running locally on its standard port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
/// Default model matches the LM Studio local-first default.
const DEFAULT_MODEL: &str = "ministral-3b-2512";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(serde::Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

impl ApiResponse {
    /// Joins every `text` block; `thinking` and `tool_use` blocks carry no reply text.
    fn reply_text(self) -> String {
        self.content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect()
    }
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Payload of one server-sent event on a streaming response.
#[derive(Deserialize)]
struct StreamPayload {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<StreamDelta>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamDelta {
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

#[derive(Debug, PartialEq, Eq)]
enum StreamItem {
    Text(String),
    Stop,
    Skip,
}

/// HTTP client for the Anthropic Messages API (and compatible endpoints such as
/// LM Studio).
///
/// The rendered prompt is sent as a single `user` message. Streaming requests
/// set `"stream": true` and yield the text of every `content_block_delta`
/// event until `message_stop`.
///
/// **Local-first defaults**: targets LM Studio on `http://localhost:1234` without
/// an API key.  Override via environment variables to target the Anthropic cloud:
///
/// ```text
/// ANTHROPIC_BASE_URL=https://api.anthropic.com
/// ANTHROPIC_API_KEY=sk-ant-...
/// ANTHROPIC_MODEL=claude-haiku-4-5
/// ```
///
/// Before each request the client sends a lightweight `HEAD /` probe with a
/// 2-second timeout.  If the server isn't reachable (connection refused or
/// probe timeout) the call fails immediately instead of hanging.
pub struct AnthropicModel {
    client: reqwest::Client,
    /// Connectivity probe with a short timeout; the response body is discarded.
    probe_client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    /// Full endpoint URL (base + MESSAGES_PATH).
    url: String,
    /// Base URL used for the probe (e.g. `http://localhost:1234/`).
    base_url: String,
}

impl AnthropicModel {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let trimmed = base.trim_end_matches('/');
        let url = format!("{trimmed}{MESSAGES_PATH}");
        let base_url = format!("{trimmed}/");
        Self {
            // No overall timeout: streamed replies may legitimately run long.
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            probe_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(2))
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            url,
            base_url,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        self.url = format!("{trimmed}{MESSAGES_PATH}");
        self.base_url = format!("{trimmed}/");
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Construct from environment variables with local-first defaults:
    ///
    /// | Variable               | Default                 | Purpose                 |
    /// |------------------------|-------------------------|-------------------------|
    /// | `ANTHROPIC_BASE_URL`   | `http://localhost:1234` | LM Studio / any server  |
    /// | `ANTHROPIC_MODEL`      | `ministral-3b-2512`     | Model name              |
    /// | `ANTHROPIC_API_KEY`    | `""` (empty)            | Not required for local  |
    /// | `ANTHROPIC_MAX_TOKENS` | `1024`                  | Reply length cap        |
    pub fn from_env() -> Self {
        let base = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let max_tokens = match std::env::var("ANTHROPIC_MAX_TOKENS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid ANTHROPIC_MAX_TOKENS={raw}, using {DEFAULT_MAX_TOKENS}");
                DEFAULT_MAX_TOKENS
            }),
            Err(_) => DEFAULT_MAX_TOKENS,
        };
        Self::new(key, model, base).with_max_tokens(max_tokens)
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    async fn probe(&self) -> Result<(), DomainError> {
        // Any HTTP response, even 4xx/5xx, means the server is up.
        match self.probe_client.head(&self.base_url).send().await {
            Err(e) if e.is_connect() || e.is_timeout() => Err(DomainError::model_invocation(format!(
                "AnthropicModel: server not reachable at {}: {e}",
                self.base_url.trim_end_matches('/')
            ))),
            _ => Ok(()),
        }
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, DomainError> {
        self.probe().await?;

        let request = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::model_invocation(format!("AnthropicModel: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("AnthropicModel: API returned {status}: {body}");
            return Err(DomainError::model_invocation(format!(
                "AnthropicModel: API returned {status}"
            )));
        }

        Ok(response)
    }

    fn parse_event(data: &str) -> Result<StreamItem, DomainError> {
        let payload: StreamPayload = serde_json::from_str(data).map_err(|e| {
            DomainError::model_invocation(format!("AnthropicModel: malformed stream event: {e}"))
        })?;

        match payload.kind.as_str() {
            "content_block_delta" => Ok(payload
                .delta
                .and_then(|d| d.text)
                .map(StreamItem::Text)
                .unwrap_or(StreamItem::Skip)),
            "message_stop" => Ok(StreamItem::Stop),
            "error" => Err(DomainError::model_invocation(format!(
                "AnthropicModel: stream error: {}",
                payload.error.map(|e| e.message).unwrap_or_default()
            ))),
            _ => Ok(StreamItem::Skip),
        }
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    async fn invoke(&self, prompt: &str) -> Result<String, DomainError> {
        let response = self.send(prompt, false).await?;

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            DomainError::model_invocation(format!("AnthropicModel: failed to parse response: {e}"))
        })?;

        Ok(api_response.reply_text())
    }

    async fn invoke_streaming(&self, prompt: &str) -> Result<ReplyStream, DomainError> {
        let response = self.send(prompt, true).await?;
        debug!("AnthropicModel: streaming from {}", self.url);

        let state = SseState {
            body: Box::pin(response.bytes_stream()),
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            stopped: false,
            finished: false,
        };

        Ok(stream::unfold(state, |mut state| async move {
            loop {
                if let Some(text) = state.pending.pop_front() {
                    return Some((Ok(text), state));
                }
                if state.finished {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        for data in state.decoder.push(&chunk) {
                            match AnthropicModel::parse_event(&data) {
                                Ok(StreamItem::Text(text)) => state.pending.push_back(text),
                                Ok(StreamItem::Stop) => {
                                    state.stopped = true;
                                    state.finished = true;
                                }
                                Ok(StreamItem::Skip) => {}
                                Err(e) => {
                                    state.pending.clear();
                                    state.finished = true;
                                    return Some((Err(e), state));
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((
                            Err(DomainError::model_invocation(format!(
                                "AnthropicModel: stream interrupted: {e}"
                            ))),
                            state,
                        ));
                    }
                    None => {
                        state.finished = true;
                        if !state.stopped {
                            warn!("AnthropicModel: stream closed before message_stop");
                            return Some((
                                Err(DomainError::model_invocation(
                                    "AnthropicModel: stream ended before message_stop",
                                )),
                                state,
                            ));
                        }
                    }
                }
            }
        })
        .boxed())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

struct SseState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    /// Set once `message_stop` arrives; a body that ends without it was cut short.
    stopped: bool,
    finished: bool,
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly. Each completed
/// event yields its (possibly multi-line) `data` field.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(std::mem::take(&mut self.data).join("\n"));
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
            // `event:`, `id:`, `retry:` and comment lines carry nothing we need.
        }

        events
    }
}
