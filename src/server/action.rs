use std::collections::HashMap;

use tracing::info;

use crate::server::services::tools::{ToolOutcome, ToolRegistry};

/// Dispatches a client-originated action directly to its tool, skipping the
/// router entirely. Returns `None` when the request is ordinary chat.
///
/// Currently the only action is `recalculate`: the loan card's button posts
/// the edited inputs back as action context, and the reply is a fresh card.
pub fn try_dispatch(
    text: &str,
    client_context: &HashMap<String, String>,
    tools: &ToolRegistry,
    surface_mode: bool,
) -> Option<ToolOutcome> {
    if client_context.is_empty() || !text.to_lowercase().contains("recalculate") {
        return None;
    }

    let principal = coerce_f64(client_context.get("principal"));
    let annual_rate = coerce_f64(client_context.get("annualRate"));
    let years = coerce_f64(client_context.get("years")) as u32;
    info!(principal, annual_rate, years, "dispatching recalculate action");

    Some(tools.loan().calculate(principal, annual_rate, years, surface_mode))
}

/// Action context values arrive as strings typed by the user; anything that
/// does not parse is treated as zero rather than failing the action.
fn coerce_f64(value: Option<&String>) -> f64 {
    value
        .map(|v| v.trim().parse::<f64>().unwrap_or(0.0))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::services::tools::{
        LoanCalculator, PlaceSearchService, ProductSearchService, StockChartService, ToolReply,
    };

    fn registry() -> ToolRegistry {
        ToolRegistry::new(
            LoanCalculator,
            PlaceSearchService::with_base_url("http://localhost:1"),
            StockChartService::with_base_url("http://localhost:1"),
            ProductSearchService::with_base_url("http://localhost:1"),
        )
    }

    fn context(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn recalculate_with_context_bypasses_the_router() {
        let ctx = context(&[("principal", "50000"), ("annualRate", "4.5"), ("years", "10")]);
        let outcome = try_dispatch("recalculate", &ctx, &registry(), true)
            .expect("recalculate should dispatch");
        assert!(matches!(outcome.reply, ToolReply::Surface(_)));
    }

    #[test]
    fn plain_chat_is_not_dispatched() {
        let ctx = context(&[("principal", "50000")]);
        assert!(try_dispatch("what about my loan?", &ctx, &registry(), true).is_none());
        assert!(try_dispatch("recalculate", &HashMap::new(), &registry(), true).is_none());
    }

    #[test]
    fn absurd_term_from_the_client_degrades_to_text() {
        let ctx = context(&[
            ("principal", "50000"),
            ("annualRate", "4.5"),
            ("years", "99999999999"),
        ]);
        let outcome = try_dispatch("recalculate", &ctx, &registry(), true)
            .expect("recalculate should dispatch");
        assert!(matches!(outcome.reply, ToolReply::Text(_)));
    }

    #[test]
    fn unparseable_values_coerce_to_zero() {
        assert_eq!(coerce_f64(Some(&"abc".to_string())), 0.0);
        assert_eq!(coerce_f64(Some(&" 42.5 ".to_string())), 42.5);
        assert_eq!(coerce_f64(None), 0.0);
    }
}
