use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use axum::Json;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use crate::server::action;
use crate::server::config::AppState;
use crate::server::session::{run_session, SessionEvent};
use crate::server::surface::ChatResponse;

use super::chat::ChatRequest;
use super::{outcome_response, surface_mode};

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// Streaming chat turn. Emits `a2ui` events per tool surface in call order,
/// then `text` chunks, then a single `done`.
pub async fn chat_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Sse<KeepAliveStream<EventStream>> {
    let surface_mode = surface_mode(&headers);
    info!(text = %request.text, surface_mode, "streaming chat turn");

    let empty = HashMap::new();
    let client_context = request.client_context.as_ref().unwrap_or(&empty);
    if let Some(outcome) =
        action::try_dispatch(&request.text, client_context, &state.tools, surface_mode)
    {
        let events = dispatch_events(outcome_response(outcome));
        let stream = stream::iter(events.into_iter().map(Ok)).boxed();
        return Sse::new(stream).keep_alive(KeepAlive::default());
    }

    let rx = run_session(state, request.text, surface_mode);
    let stream = ReceiverStream::new(rx)
        .map(|event| Ok(session_event(event)))
        .boxed();
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// A dispatched action bypasses the session: one reply event, then done.
fn dispatch_events(response: ChatResponse) -> Vec<Event> {
    let reply = match &response {
        ChatResponse::A2ui { .. } => sse_event("a2ui", &response),
        ChatResponse::Text { text } => sse_event("text", &json!({ "text": text })),
    };
    vec![reply, done_event()]
}

fn session_event(event: SessionEvent) -> Event {
    match event {
        SessionEvent::Surface(data) => sse_event("a2ui", &ChatResponse::A2ui { data }),
        SessionEvent::Text(text) => sse_event("text", &json!({ "text": text })),
        SessionEvent::Done => done_event(),
    }
}

fn done_event() -> Event {
    Event::default().event("done").data("{}")
}

fn sse_event<T: Serialize>(name: &str, payload: &T) -> Event {
    let data = match serde_json::to_string(payload) {
        Ok(data) => data,
        Err(e) => {
            error!(event = name, error = %e, "failed to serialize SSE payload");
            "{}".to_string()
        }
    };
    Event::default().event(name).data(data)
}
