#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::MockServer;

use a2ui_agent::server::config::{app_router, AppState};
use a2ui_agent::server::services::gemini::GeminiService;
use a2ui_agent::server::services::tools::{
    tool_schemas, LoanCalculator, PlaceSearchService, ProductSearchService, StockChartService,
    ToolRegistry,
};

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";
pub const STREAM_PATH: &str = "/v1beta/models/gemini-2.0-flash:streamGenerateContent";

pub struct TestApp {
    pub server: TestServer,
    pub llm: MockServer,
    pub places: MockServer,
    pub stocks: MockServer,
    pub shopping: MockServer,
}

/// Full application wired against mock backends.
pub async fn spawn_app() -> TestApp {
    let llm = MockServer::start().await;
    let places = MockServer::start().await;
    let stocks = MockServer::start().await;
    let shopping = MockServer::start().await;

    let gemini = GeminiService::with_base_url(llm.uri(), tool_schemas());
    let tools = ToolRegistry::new(
        LoanCalculator,
        PlaceSearchService::with_base_url(places.uri()),
        StockChartService::with_base_url(stocks.uri()),
        ProductSearchService::with_base_url(shopping.uri()),
    );
    let server =
        TestServer::new(app_router(AppState::new(gemini, tools))).expect("test server starts");

    TestApp {
        server,
        llm,
        places,
        stocks,
        shopping,
    }
}

/// Router response carrying the given function calls, in order.
pub fn function_call_response(calls: &[(&str, Value)]) -> Value {
    let parts: Vec<Value> = calls
        .iter()
        .map(|(name, args)| json!({ "functionCall": { "name": name, "args": args } }))
        .collect();
    json!({ "candidates": [{ "content": { "role": "model", "parts": parts } }] })
}

/// Router response answering directly with text.
pub fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

/// SSE body in the streaming generate format, one text part per event.
pub fn commentary_sse_body(chunks: &[&str]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            let payload = json!({
                "candidates": [{ "content": { "parts": [{ "text": chunk }] } }]
            });
            format!("data: {payload}\n\n")
        })
        .collect()
}

pub fn stock_history() -> Value {
    json!({
        "prices": [
            { "date": "2025-09-01", "close": 180.0 },
            { "date": "2026-03-01", "close": 195.25 }
        ]
    })
}

/// Parses an SSE response body into (event, data) pairs, ignoring keep-alive
/// comments.
pub fn parse_sse(body: &str) -> Vec<(String, String)> {
    let mut events = Vec::new();
    let mut name = None;
    let mut data = String::new();
    for line in body.lines() {
        if let Some(event) = line.strip_prefix("event:") {
            name = Some(event.trim().to_string());
        } else if let Some(payload) = line.strip_prefix("data:") {
            data.push_str(payload.trim_start());
        } else if line.is_empty() {
            if let Some(event) = name.take() {
                events.push((event, std::mem::take(&mut data)));
            }
            data.clear();
        }
    }
    if let Some(event) = name {
        events.push((event, data));
    }
    events
}
