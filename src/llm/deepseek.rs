//! DeepSeek chat-completion provider (OpenAI-compatible REST surface).
//!
//! Non-streaming calls parse `choices[0].message.content` from the JSON
//! body. Streaming calls consume the `text/event-stream` response line by
//! line: `data: ` frames carry JSON chunks whose `choices[0].delta.content`
//! is the next text fragment, and `data: [DONE]` terminates the stream.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::provider::{ChatRequest, FragmentStream, LlmProvider};

/// DeepSeek API client.
pub struct DeepSeekProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl DeepSeekProvider {
    pub fn new(base_url: impl Into<String>, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn wire_body<'a>(&'a self, request: &'a ChatRequest, stream: bool) -> CompletionBody<'a> {
        CompletionBody {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            stream,
        }
    }

    async fn send(
        &self,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.wire_body(request, stream))
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let response = self.send(&request, false).await?;
        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))
    }

    async fn stream(&self, request: ChatRequest) -> Result<FragmentStream, LlmError> {
        let response = self.send(&request, true).await?;

        let decoder = SseDecoder {
            inner: response
                .bytes_stream()
                .map(|item| item.map_err(|e| LlmError::Stream(e.to_string())))
                .boxed(),
            buf: Vec::new(),
            done: false,
        };
        Ok(Box::pin(stream::try_unfold(decoder, next_fragment)))
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

// ── SSE decoding ────────────────────────────────────────────────────

/// Incremental decoder over the raw byte stream.
///
/// Bytes accumulate in `buf` until a full line is available; lines are
/// only split at `\n`, so multi-byte UTF-8 sequences inside a frame are
/// never cut by network chunking.
struct SseDecoder {
    inner: BoxStream<'static, Result<bytes::Bytes, LlmError>>,
    buf: Vec<u8>,
    done: bool,
}

/// What one SSE line contributed.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    /// A non-empty text fragment.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Blank line, comment, or a chunk without text content.
    Skip,
}

fn parse_sse_line(line: &str) -> Result<SseLine, LlmError> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| LlmError::InvalidResponse(format!("bad stream chunk: {e}")))?;
    let fragment = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty());
    Ok(match fragment {
        Some(text) => SseLine::Delta(text),
        None => SseLine::Skip,
    })
}

async fn next_fragment(
    mut decoder: SseDecoder,
) -> Result<Option<(String, SseDecoder)>, LlmError> {
    loop {
        if decoder.done {
            return Ok(None);
        }

        if let Some(pos) = decoder.buf.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = decoder.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            match parse_sse_line(&line)? {
                SseLine::Delta(text) => return Ok(Some((text, decoder))),
                SseLine::Done => {
                    decoder.done = true;
                    return Ok(None);
                }
                SseLine::Skip => continue,
            }
        }

        match decoder.inner.next().await {
            Some(Ok(bytes)) => decoder.buf.extend_from_slice(&bytes),
            Some(Err(e)) => return Err(e),
            None => {
                decoder.done = true;
                // A final frame without a trailing newline still counts.
                if !decoder.buf.is_empty() {
                    let line_bytes = std::mem::take(&mut decoder.buf);
                    let line = String::from_utf8_lossy(&line_bytes);
                    if let SseLine::Delta(text) = parse_sse_line(&line)? {
                        return Ok(Some((text, decoder)));
                    }
                }
                return Ok(None);
            }
        }
    }
}
