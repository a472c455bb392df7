use serde::Deserialize;
use serde_json::{json, Value};

use crate::server::error::AgentError;
use crate::server::services::gemini::{FunctionDeclaration, RawToolCall};
use crate::server::surface::Fragment;

pub mod loan;
pub mod places;
pub mod shopping;
pub mod stocks;

pub use loan::LoanCalculator;
pub use places::PlaceSearchService;
pub use shopping::ProductSearchService;
pub use stocks::StockChartService;

/// What a single tool invocation produced: a renderable fragment or plain
/// text.
#[derive(Debug, Clone)]
pub enum ToolReply {
    Surface(Fragment),
    Text(String),
}

/// A tool result plus the free-text context string later fed to the
/// commentary generator. An empty context means the tool had nothing to add.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub reply: ToolReply,
    pub context: String,
}

impl ToolOutcome {
    pub fn surface(fragment: Fragment, context: impl Into<String>) -> Self {
        Self {
            reply: ToolReply::Surface(fragment),
            context: context.into(),
        }
    }

    pub fn text(text: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            reply: ToolReply::Text(text.into()),
            context: context.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoanArgs {
    #[serde(default)]
    pub principal: f64,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub years: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceArgs {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReserveArgs {
    #[serde(default)]
    pub restaurant_name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_guests")]
    pub guests: f64,
}

fn default_guests() -> f64 {
    2.0
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductArgs {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockArgs {
    #[serde(default)]
    pub symbol: String,
}

/// The closed set of tools this agent can run. Router output is resolved
/// into one of these exactly once per call; there is no string dispatch past
/// this point.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tool_name", content = "tool_args", rename_all = "snake_case")]
pub enum ToolInvocation {
    CalculateLoan(LoanArgs),
    FindPlaces(PlaceArgs),
    ReserveTable(ReserveArgs),
    SearchProducts(ProductArgs),
    GetStockChart(StockArgs),
}

impl ToolInvocation {
    pub fn name(&self) -> &'static str {
        match self {
            ToolInvocation::CalculateLoan(_) => "calculate_loan",
            ToolInvocation::FindPlaces(_) => "find_places",
            ToolInvocation::ReserveTable(_) => "reserve_table",
            ToolInvocation::SearchProducts(_) => "search_products",
            ToolInvocation::GetStockChart(_) => "get_stock_chart",
        }
    }
}

pub struct ToolRegistry {
    loan: LoanCalculator,
    places: PlaceSearchService,
    stocks: StockChartService,
    shopping: ProductSearchService,
}

impl ToolRegistry {
    pub fn new(
        loan: LoanCalculator,
        places: PlaceSearchService,
        stocks: StockChartService,
        shopping: ProductSearchService,
    ) -> Self {
        Self {
            loan,
            places,
            stocks,
            shopping,
        }
    }

    pub fn loan(&self) -> &LoanCalculator {
        &self.loan
    }

    /// Resolves a raw router call against the closed tool set.
    pub fn resolve(call: &RawToolCall) -> Result<ToolInvocation, AgentError> {
        let args = if call.tool_args.is_null() {
            json!({})
        } else {
            call.tool_args.clone()
        };
        serde_json::from_value(json!({
            "tool_name": call.tool_name,
            "tool_args": args,
        }))
        .map_err(|e| AgentError::tool(&call.tool_name, format!("unknown tool or bad arguments ({e})")))
    }

    /// Runs one resolved invocation. `surface_mode` reflects the client's
    /// structured-surface capability.
    pub async fn invoke(
        &self,
        invocation: ToolInvocation,
        surface_mode: bool,
    ) -> Result<ToolOutcome, AgentError> {
        let name = invocation.name();
        match invocation {
            ToolInvocation::CalculateLoan(args) => Ok(self.loan.calculate(
                args.principal,
                args.rate,
                args.years as u32,
                surface_mode,
            )),
            ToolInvocation::FindPlaces(args) => Ok(self
                .places
                .find_places(&args.location, args.keyword.as_deref())
                .await),
            ToolInvocation::ReserveTable(args) => Ok(self.places.reserve_table(
                &args.restaurant_name,
                &args.date,
                args.guests as u32,
            )),
            ToolInvocation::SearchProducts(args) => self
                .shopping
                .search_products(&args.query)
                .await
                .map_err(|e| AgentError::tool(name, e)),
            ToolInvocation::GetStockChart(args) => self
                .stocks
                .chart(&args.symbol)
                .await
                .map_err(|e| AgentError::tool(name, e)),
        }
    }
}

/// Function-calling schemas advertised to the router, fixed at startup.
pub fn tool_schemas() -> Vec<FunctionDeclaration> {
    vec![
        declaration(
            "calculate_loan",
            "Calculate monthly loan payments and total interest. Use this tool \
             when the user asks about loan, mortgage, or interest payments.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "principal": {
                        "type": "NUMBER",
                        "description": "The loan amount (principal) in dollars."
                    },
                    "rate": {
                        "type": "NUMBER",
                        "description": "The annual interest rate as a percentage (e.g. 5.5 for 5.5%)."
                    },
                    "years": {
                        "type": "INTEGER",
                        "description": "The loan term in years."
                    }
                },
                "required": ["principal", "rate", "years"]
            }),
        ),
        declaration(
            "find_places",
            "Find places such as restaurants or shops near a location. Use this \
             tool when the user asks where to eat or what is nearby.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "location": {
                        "type": "STRING",
                        "description": "The city or area to search in (e.g. Seoul, Gangnam)."
                    },
                    "keyword": {
                        "type": "STRING",
                        "description": "Optional keyword such as a cuisine or place type."
                    }
                },
                "required": ["location"]
            }),
        ),
        declaration(
            "reserve_table",
            "Make a table reservation at a restaurant.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "restaurant_name": {
                        "type": "STRING",
                        "description": "Name of the restaurant."
                    },
                    "date": {
                        "type": "STRING",
                        "description": "Date and time of the reservation (e.g. 2026-05-20 19:00)."
                    },
                    "guests": {
                        "type": "INTEGER",
                        "description": "Number of guests."
                    }
                },
                "required": ["restaurant_name", "date", "guests"]
            }),
        ),
        declaration(
            "search_products",
            "Search for products to buy.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "query": {
                        "type": "STRING",
                        "description": "What to search for (e.g. wireless earbuds)."
                    }
                },
                "required": ["query"]
            }),
        ),
        declaration(
            "get_stock_chart",
            "Get the one-year stock price history chart for a given symbol.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "symbol": {
                        "type": "STRING",
                        "description": "The stock symbol (e.g. AAPL, GOOG, TSLA)."
                    }
                },
                "required": ["symbol"]
            }),
        ),
    ]
}

fn declaration(name: &str, description: &str, parameters: Value) -> FunctionDeclaration {
    FunctionDeclaration {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Value) -> RawToolCall {
        RawToolCall {
            tool_name: name.to_string(),
            tool_args: args,
        }
    }

    #[test]
    fn resolves_known_tools_into_typed_invocations() {
        let invocation = ToolRegistry::resolve(&call(
            "calculate_loan",
            json!({ "principal": 50000, "rate": 4.5, "years": 10 }),
        ))
        .unwrap();
        match invocation {
            ToolInvocation::CalculateLoan(args) => {
                assert_eq!(args.principal, 50000.0);
                assert_eq!(args.rate, 4.5);
                assert_eq!(args.years, 10.0);
            }
            other => panic!("expected loan invocation, got {other:?}"),
        }
    }

    #[test]
    fn missing_arguments_fall_back_to_defaults() {
        let invocation =
            ToolRegistry::resolve(&call("reserve_table", json!({ "restaurant_name": "Oro" })))
                .unwrap();
        match invocation {
            ToolInvocation::ReserveTable(args) => {
                assert_eq!(args.restaurant_name, "Oro");
                assert_eq!(args.guests, 2.0);
            }
            other => panic!("expected reserve invocation, got {other:?}"),
        }
    }

    #[test]
    fn null_arguments_are_treated_as_empty() {
        let invocation =
            ToolRegistry::resolve(&call("search_products", Value::Null)).unwrap();
        assert_eq!(invocation.name(), "search_products");
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let result = ToolRegistry::resolve(&call("launch_rocket", json!({})));
        assert!(matches!(
            result,
            Err(crate::server::error::AgentError::Tool { name, .. }) if name == "launch_rocket"
        ));
    }

    #[test]
    fn schema_names_match_the_registry() {
        let names: Vec<_> = tool_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "calculate_loan",
                "find_places",
                "reserve_table",
                "search_products",
                "get_stock_chart"
            ]
        );
    }
}
