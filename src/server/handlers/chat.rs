use std::collections::HashMap;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::server::action;
use crate::server::config::AppState;
use crate::server::error::ROUTER_APOLOGY;
use crate::server::services::gemini::RouterOutcome;
use crate::server::services::tools::ToolReply;
use crate::server::session::execute_call;
use crate::server::surface::{aggregate, AggregateReply, CallResult, ChatResponse};

use super::{outcome_response, surface_mode};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
    /// Action context echoed back by the client when a button is pressed.
    #[serde(default)]
    pub client_context: Option<HashMap<String, String>>,
}

/// Non-streaming chat turn: route, run every tool call in order, and
/// aggregate the results into exactly one reply.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let surface_mode = surface_mode(&headers);
    info!(text = %request.text, surface_mode, "chat turn");

    let empty = HashMap::new();
    let client_context = request.client_context.as_ref().unwrap_or(&empty);
    if let Some(outcome) =
        action::try_dispatch(&request.text, client_context, &state.tools, surface_mode)
    {
        return Json(outcome_response(outcome));
    }

    let routed = match state.gemini.route_query(&request.text).await {
        Ok(routed) => routed,
        Err(e) => {
            warn!(error = %e, "routing failed");
            return Json(ChatResponse::text(ROUTER_APOLOGY));
        }
    };

    let calls = match routed {
        RouterOutcome::Text(answer) => return Json(ChatResponse::text(answer)),
        RouterOutcome::ToolCalls(calls) => calls,
    };

    let mut results = Vec::new();
    for call in &calls {
        match execute_call(&state.tools, call, surface_mode).await {
            Ok(outcome) => results.push(match outcome.reply {
                ToolReply::Surface(fragment) => CallResult::Surface(fragment),
                ToolReply::Text(text) => CallResult::Text(text),
            }),
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "tool call failed");
                results.push(CallResult::Text(format!("{e}.")));
            }
        }
    }

    match aggregate(results) {
        Ok(AggregateReply::Surface(surface)) => Json(ChatResponse::surface(surface)),
        Ok(AggregateReply::Text(text)) => Json(ChatResponse::text(text)),
        Err(e) => {
            warn!(error = %e, "aggregation failed");
            Json(ChatResponse::text(
                "Sorry, I could not combine the tool results. Please try again.",
            ))
        }
    }
}
