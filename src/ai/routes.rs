//! AI proxy endpoints.
//!
//! `/chat` relays a full completion as plain text. `/chat_stream` and
//! `/divination` relay a streamed completion over server-sent events
//! using cumulative framing: every event's data is a JSON object whose
//! `content` holds the entire text accumulated so far, not just the new
//! fragment, so each event is self-contained and clients never have to
//! concatenate deltas. This framing is a protocol commitment — existing
//! clients depend on it, so it must not be "optimized" into delta-only
//! events. No terminal sentinel is sent; the SSE stream ends when the
//! provider's does, and a mid-stream provider error aborts it with no
//! retry.

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::ai::prompts;
use crate::error::{ApiError, LlmError};
use crate::llm::{ChatRequest, FragmentStream};
use crate::server::AppState;

/// Generation cap shared by every AI route.
const MAX_TOKENS: u32 = 1024;
/// Deterministic sampling for the synchronous chat route.
const CHAT_TEMPERATURE: f32 = 0.0;
/// Sampling for both streamed routes.
const STREAM_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Deserialize)]
struct ChatBody {
    userinput: String,
}

#[derive(Debug, Deserialize)]
struct DivinationBody {
    q: String,
    current: String,
    future: String,
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<String, ApiError> {
    let llm = state.llm()?;
    let text = llm
        .complete(ChatRequest {
            system: prompts::REBUTTAL_PERSONA.to_string(),
            user: body.userinput,
            temperature: CHAT_TEMPERATURE,
            max_tokens: MAX_TOKENS,
        })
        .await?;
    Ok(text)
}

async fn chat_stream(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, LlmError>>>, ApiError> {
    let llm = state.llm()?;
    let fragments = llm
        .stream(ChatRequest {
            system: prompts::REBUTTAL_PERSONA.to_string(),
            user: body.userinput,
            temperature: STREAM_TEMPERATURE,
            max_tokens: MAX_TOKENS,
        })
        .await?;
    Ok(Sse::new(cumulative_events(fragments)))
}

async fn divination(
    State(state): State<AppState>,
    Json(body): Json<DivinationBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, LlmError>>>, ApiError> {
    let llm = state.llm()?;
    let fragments = llm
        .stream(ChatRequest {
            system: prompts::divination_prompt(&body.q, &body.current, &body.future),
            user: prompts::DIVINATION_OPENING.to_string(),
            temperature: STREAM_TEMPERATURE,
            max_tokens: MAX_TOKENS,
        })
        .await?;
    Ok(Sse::new(cumulative_events(fragments)))
}

/// Fold provider fragments into cumulative event payloads.
///
/// Each incoming fragment extends a running buffer; the emitted payload
/// carries the whole buffer. Errors pass through untouched, ending the
/// relay where the provider failed.
fn cumulative_payloads(
    fragments: FragmentStream,
) -> impl Stream<Item = Result<String, LlmError>> {
    let mut accumulated = String::new();
    fragments.map(move |item| {
        item.map(|fragment| {
            tracing::debug!(fragment = %fragment, "Received stream fragment");
            accumulated.push_str(&fragment);
            json!({ "content": accumulated.as_str() }).to_string()
        })
    })
}

fn cumulative_events(fragments: FragmentStream) -> impl Stream<Item = Result<Event, LlmError>> {
    cumulative_payloads(fragments).map(|item| item.map(|payload| Event::default().data(payload)))
}

/// Build the AI proxy routes.
pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat_stream", post(chat_stream))
        .route("/divination", post(divination))
}
