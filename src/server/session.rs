use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::server::config::AppState;
use crate::server::error::{AgentError, ROUTER_APOLOGY};
use crate::server::services::gemini::{RawToolCall, RouterOutcome};
use crate::server::services::tools::{ToolOutcome, ToolRegistry, ToolReply};
use crate::server::surface::{validate_fragment, A2uiData};

/// One ordered event of a streaming session. Surfaces come first, then text,
/// then exactly one `Done`.
#[derive(Debug)]
pub enum SessionEvent {
    Surface(A2uiData),
    Text(String),
    Done,
}

const CHUNK_WORDS: usize = 3;
const CHUNK_DELAY: Duration = Duration::from_millis(20);

/// Runs one streaming chat turn. The returned channel yields per-call surface
/// events in router call order, then commentary text chunks, then `Done`.
/// `Done` is sent exactly once, on every path, including panics short of
/// aborting the runtime.
pub fn run_session(state: AppState, question: String, surface_mode: bool) -> mpsc::Receiver<SessionEvent> {
    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(async move {
        run_turn(&state, &question, surface_mode, &tx).await;
        let _ = tx.send(SessionEvent::Done).await;
    });
    rx
}

async fn run_turn(
    state: &AppState,
    question: &str,
    surface_mode: bool,
    tx: &mpsc::Sender<SessionEvent>,
) {
    let outcome = match state.gemini.route_query(question).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "routing failed");
            stream_text(tx, ROUTER_APOLOGY).await;
            return;
        }
    };

    let calls = match outcome {
        RouterOutcome::Text(answer) => {
            stream_text(tx, &answer).await;
            return;
        }
        RouterOutcome::ToolCalls(calls) => calls,
    };

    // Each call is isolated: a failure turns into a context line for the
    // commentary phase and the remaining calls still run.
    let mut contexts = Vec::new();
    for call in &calls {
        match execute_call(&state.tools, call, surface_mode).await {
            Ok(outcome) => {
                match outcome.reply {
                    ToolReply::Surface(fragment) => {
                        if tx
                            .send(SessionEvent::Surface(fragment.into_a2ui()))
                            .await
                            .is_err()
                        {
                            return;
                        }
                        if !outcome.context.is_empty() {
                            contexts.push(outcome.context);
                        }
                    }
                    ToolReply::Text(text) => {
                        if outcome.context.is_empty() {
                            contexts.push(text);
                        } else {
                            contexts.push(outcome.context);
                        }
                    }
                }
            }
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "tool call failed");
                contexts.push(format!("{e}."));
            }
        }
    }

    if contexts.is_empty() {
        return;
    }

    let mut chunks = state.gemini.commentary_stream(question, &contexts).await;
    let mut received = false;
    while let Some(chunk) = chunks.recv().await {
        received = true;
        if tx.send(SessionEvent::Text(chunk)).await.is_err() {
            return;
        }
    }
    if !received {
        // Commentary collaborator produced nothing; fall back to the raw
        // context lines so the turn still ends with a narrated answer.
        stream_text(tx, &contexts.join(" ")).await;
    }
}

/// Resolves, runs, and validates one tool call. Shared by the streaming
/// session and the non-streaming chat handler.
pub(crate) async fn execute_call(
    tools: &ToolRegistry,
    call: &RawToolCall,
    surface_mode: bool,
) -> Result<ToolOutcome, AgentError> {
    let invocation = ToolRegistry::resolve(call)?;
    let outcome = tools.invoke(invocation, surface_mode).await?;
    if let ToolReply::Surface(fragment) = &outcome.reply {
        validate_fragment(fragment).map_err(|e| AgentError::tool(&call.tool_name, e))?;
    }
    Ok(outcome)
}

async fn stream_text(tx: &mpsc::Sender<SessionEvent>, text: &str) {
    for chunk in word_chunks(text, CHUNK_WORDS) {
        if tx.send(SessionEvent::Text(chunk)).await.is_err() {
            return;
        }
        tokio::time::sleep(CHUNK_DELAY).await;
    }
}

/// Splits text into small word groups for a typed-out feel. Each chunk keeps
/// a trailing space so the client can concatenate them directly.
fn word_chunks(text: &str, size: usize) -> Vec<String> {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .chunks(size)
        .map(|words| format!("{} ", words.join(" ")))
        .collect()
}
