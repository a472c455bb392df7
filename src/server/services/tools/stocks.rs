use anyhow::{bail, Result};
use serde::Deserialize;
use tracing::info;

use crate::configuration::StocksSettings;
use crate::server::surface::{
    call_token, ChartDataPoint, Component, ComponentEntry, Fragment, TextContent,
};

use super::ToolOutcome;

const CHART_COLOR: &str = "#0F9D58";

pub struct StockChartService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    prices: Vec<PricePoint>,
}

#[derive(Debug, Deserialize)]
struct PricePoint {
    date: String,
    close: f64,
}

impl StockChartService {
    pub fn new(settings: &StocksSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Test constructor pointing at a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches one year of closing prices and renders them as a chart card.
    /// Unknown symbols degrade to text; transport failures bubble up so the
    /// session can isolate the call.
    pub async fn chart(&self, symbol: &str) -> Result<ToolOutcome> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            bail!("no stock symbol provided");
        }
        info!(%symbol, "fetching price history");

        let url = format!("{}/history", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.as_str()), ("range", "1y")])
            .send()
            .await?
            .error_for_status()?;
        let body: HistoryResponse = response.json().await?;

        if body.prices.is_empty() {
            return Ok(ToolOutcome::text(
                format!("No data found for {symbol}."),
                format!("No market data was available for {symbol}."),
            ));
        }

        let last = body.prices[body.prices.len() - 1].close;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for point in &body.prices {
            min = min.min(point.close);
            max = max.max(point.close);
        }

        let context = format!(
            "{symbol} last closed at ${last:.2}; its one-year range is \
             ${min:.2} to ${max:.2}."
        );
        Ok(ToolOutcome::surface(
            build_chart_card(&symbol, last, body.prices),
            context,
        ))
    }
}

fn build_chart_card(symbol: &str, last: f64, prices: Vec<PricePoint>) -> Fragment {
    let token = call_token();
    let id = |suffix: &str| format!("stock_{suffix}_{token}");

    let data = prices
        .into_iter()
        .map(|point| ChartDataPoint {
            label: point.date,
            value: point.close,
        })
        .collect();

    let components = vec![
        ComponentEntry::new(
            id("header"),
            Component::Text {
                usage_hint: Some("heading".to_string()),
                text: TextContent::literal(format!("{symbol}: ${last:.2}")),
            },
        ),
        ComponentEntry::new(
            id("chart"),
            Component::Chart {
                data,
                color: Some(CHART_COLOR.to_string()),
            },
        ),
        ComponentEntry::new(id("card"), Component::column(vec![id("header"), id("chart")])),
    ];

    Fragment {
        surface_id: "stock".to_string(),
        components,
        data_model: Vec::new(),
        root: id("card"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::services::tools::ToolReply;
    use crate::server::surface::validate_fragment;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn price_history_becomes_a_chart_card() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .and(query_param("symbol", "AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prices": [
                    { "date": "2025-09-01", "close": 180.0 },
                    { "date": "2025-12-01", "close": 170.5 },
                    { "date": "2026-03-01", "close": 195.25 }
                ]
            })))
            .mount(&server)
            .await;

        let service = StockChartService::with_base_url(server.uri());
        let outcome = service.chart("aapl").await.unwrap();

        let ToolReply::Surface(fragment) = outcome.reply else {
            panic!("expected surface reply");
        };
        validate_fragment(&fragment).unwrap();
        assert!(outcome.context.contains("$195.25"));
        assert!(outcome.context.contains("$170.50"));
    }

    #[tokio::test]
    async fn unknown_symbol_degrades_to_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "prices": [] })),
            )
            .mount(&server)
            .await;

        let service = StockChartService::with_base_url(server.uri());
        let outcome = service.chart("ZZZZ").await.unwrap();
        assert!(matches!(outcome.reply, ToolReply::Text(_)));
    }

    #[tokio::test]
    async fn backend_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = StockChartService::with_base_url(server.uri());
        assert!(service.chart("AAPL").await.is_err());
    }

    #[tokio::test]
    async fn empty_symbol_is_rejected() {
        let service = StockChartService::with_base_url("http://localhost:1");
        assert!(service.chart("  ").await.is_err());
    }
}
