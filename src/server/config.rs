use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::configuration::Settings;
use crate::server::handlers::{chat, chat_stream};
use crate::server::services::gemini::GeminiService;
use crate::server::services::tools::{
    self, LoanCalculator, PlaceSearchService, ProductSearchService, StockChartService,
    ToolRegistry,
};

/// Shared application state. Services are built once at startup and cloned
/// cheaply into every handler.
#[derive(Clone)]
pub struct AppState {
    pub gemini: Arc<GeminiService>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(gemini: GeminiService, tools: ToolRegistry) -> Self {
        Self {
            gemini: Arc::new(gemini),
            tools: Arc::new(tools),
        }
    }
}

/// Builds the full application from configuration.
pub fn configure_app(settings: &Settings) -> Router {
    let gemini = GeminiService::new(&settings.llm, tools::tool_schemas());
    let registry = ToolRegistry::new(
        LoanCalculator,
        PlaceSearchService::new(&settings.places),
        StockChartService::new(&settings.stocks),
        ProductSearchService::new(&settings.shopping),
    );
    app_router(AppState::new(gemini, registry))
}

/// Router over an already-built state; tests construct the state against
/// mock backends and call this directly.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    info!(
        method = %request.method(),
        path = %request.uri().path(),
        "incoming request"
    );
    next.run(request).await
}
