use axum::http::HeaderMap;
use tracing::warn;

use crate::server::services::tools::{ToolOutcome, ToolReply};
use crate::server::surface::{validate_fragment, ChatResponse};

pub mod chat;
pub mod stream;

pub use chat::{chat, ChatRequest};
pub use stream::chat_stream;

/// Clients that cannot render structured surfaces send this header as
/// `false`; everything else (including its absence) means full rendering.
pub(crate) const SURFACE_CAPABILITY_HEADER: &str = "x-client-a2ui";

pub(crate) fn surface_mode(headers: &HeaderMap) -> bool {
    headers
        .get(SURFACE_CAPABILITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| !value.eq_ignore_ascii_case("false"))
        .unwrap_or(true)
}

/// Converts a directly dispatched tool outcome into a chat reply, degrading
/// an invalid fragment to its context text instead of shipping it.
pub(crate) fn outcome_response(outcome: ToolOutcome) -> ChatResponse {
    match outcome.reply {
        ToolReply::Surface(fragment) => match validate_fragment(&fragment) {
            Ok(()) => ChatResponse::surface(fragment),
            Err(e) => {
                warn!(error = %e, "dispatched tool produced an invalid fragment");
                ChatResponse::text(outcome.context)
            }
        },
        ToolReply::Text(text) => ChatResponse::text(text),
    }
}
