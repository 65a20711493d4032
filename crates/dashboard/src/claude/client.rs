//! Claude API client.
//!
//! Non-streaming calls back the tool-use loop; the streaming call backs the
//! live answer endpoint.

use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ClaudeConfig;

use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, Message, StreamEvent, Tool};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::Unauthorized` if the API key cannot be used as a
    /// header value, or `ClaudeError::Http` if the HTTP client fails to build.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        let api_key = HeaderValue::from_str(config.api_key.expose_secret()).map_err(|_| {
            ClaudeError::Unauthorized("API key contains invalid header characters".to_string())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                api_url: config.api_url.clone(),
                model: config.model.clone(),
                max_tokens: config.max_tokens,
            }),
        })
    }

    /// Model ID requests are sent with.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    fn request(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
        stream: Option<bool>,
    ) -> ChatRequest {
        ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: self.inner.max_tokens,
            messages,
            system,
            tools,
            stream,
        }
    }

    /// Send a chat request and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, messages, system, tools), fields(model = %self.inner.model))]
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ClaudeError> {
        let request = self.request(messages, system, tools, None);

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))?;

        tracing::debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            stop_reason = ?parsed.stop_reason,
            "Claude response received"
        );

        Ok(parsed)
    }

    /// Send a chat request and get a stream of server-sent events.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial request fails. Errors after the
    /// stream has started are yielded as stream items.
    #[instrument(skip(self, messages, system, tools), fields(model = %self.inner.model))]
    pub async fn chat_stream(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<impl Stream<Item = Result<StreamEvent, ClaudeError>>, ClaudeError> {
        let request = self.request(messages, system, tools, Some(true));

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_status(status, response).await);
        }

        Ok(stream! {
            use futures::StreamExt;

            let mut buffer = String::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        match std::str::from_utf8(&chunk) {
                            Ok(text) => buffer.push_str(text),
                            Err(e) => {
                                yield Err(ClaudeError::Parse(format!("Invalid UTF-8: {e}")));
                                continue;
                            }
                        }

                        while let Some(event) = extract_sse_event(&mut buffer) {
                            if let Some(parsed) = parse_sse_event(&event) {
                                yield parsed;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ClaudeError::Stream(e.to_string()));
                        break;
                    }
                }
            }
        })
    }
}

/// Map a non-success status to a `ClaudeError`.
async fn handle_error_status(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> ClaudeError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return ClaudeError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return ClaudeError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_error) => ClaudeError::Api {
                error_type: api_error.error.error_type,
                message: api_error.error.message,
            },
            Err(_) => ClaudeError::Api {
                error_type: format!("http_{}", status.as_u16()),
                message: body,
            },
        },
        Err(e) => ClaudeError::Http(e),
    }
}

/// Take one complete SSE event off the front of `buffer`.
///
/// Events are separated by a blank line; an incomplete tail stays buffered.
fn extract_sse_event(buffer: &mut String) -> Option<String> {
    buffer.find("\n\n").map(|idx| {
        let event = buffer[..idx].to_string();
        buffer.drain(..idx + 2);
        event
    })
}

/// Parse the `data:` line of an SSE event.
fn parse_sse_event(event: &str) -> Option<Result<StreamEvent, ClaudeError>> {
    if event.trim().is_empty() {
        return None;
    }

    let data = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .last()?;

    if data == "[DONE]" {
        return None;
    }

    Some(
        serde_json::from_str::<StreamEvent>(data)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse stream event: {e}"))),
    )
}
