use tracing::info;

use crate::server::surface::{
    call_token, Action, ActionContext, Component, ComponentEntry, DataModelEntry, Fragment,
    TextContent,
};

use super::ToolOutcome;

/// Pure amortization calculator. The only tool with a dual rendering mode:
/// clients without surface support get a formatted text answer instead of the
/// interactive card.
#[derive(Debug, Default)]
pub struct LoanCalculator;

/// Terms come in unchecked from router args and action context; anything
/// past this is rejected before the month arithmetic.
const MAX_TERM_YEARS: u32 = 100;

impl LoanCalculator {
    pub fn calculate(
        &self,
        principal: f64,
        annual_rate: f64,
        years: u32,
        surface_mode: bool,
    ) -> ToolOutcome {
        info!(principal, annual_rate, years, "calculating loan payments");

        if years == 0 || years > MAX_TERM_YEARS {
            return ToolOutcome::text(
                format!("The loan term must be between 1 and {MAX_TERM_YEARS} years."),
                "The loan could not be calculated because the term was out of range.",
            );
        }
        let months = years * 12;

        let monthly = monthly_payment(principal, annual_rate, months);
        let total = monthly * f64::from(months);
        let interest = total - principal;

        let context = format!(
            "A loan of ${principal:.2} at {annual_rate}% over {years} years has a \
             monthly payment of ${monthly:.2} and total interest of ${interest:.2}."
        );

        if surface_mode {
            let fragment = build_card(principal, annual_rate, years, monthly, total, interest);
            ToolOutcome::surface(fragment, context)
        } else {
            ToolOutcome::text(
                format!(
                    "Monthly payment: ${monthly:.2}. Total payment: ${total:.2}. \
                     Total interest: ${interest:.2}."
                ),
                context,
            )
        }
    }
}

fn monthly_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
    let monthly_rate = annual_rate / 100.0 / 12.0;
    if monthly_rate > 0.0 {
        let growth = (1.0 + monthly_rate).powi(months as i32);
        principal * (monthly_rate * growth) / (growth - 1.0)
    } else {
        principal / f64::from(months)
    }
}

/// Builds the interactive card: editable inputs and result labels bound to
/// one data-model namespace, plus a recalculate button that ships the current
/// input paths back as action context.
fn build_card(
    principal: f64,
    annual_rate: f64,
    years: u32,
    monthly: f64,
    total: f64,
    interest: f64,
) -> Fragment {
    let token = call_token();
    let namespace = format!("calculator_{token}");
    let id = |suffix: &str| format!("loan_{suffix}_{token}");

    let path = |field: &str| TextContent::path(format!("{namespace}.{field}"));

    let components = vec![
        ComponentEntry::new(
            id("title"),
            Component::Text {
                usage_hint: Some("heading".to_string()),
                text: TextContent::literal("Loan Calculator"),
            },
        ),
        ComponentEntry::new(
            id("principal"),
            Component::TextField {
                label: TextContent::literal("Principal ($)"),
                text: path("principal"),
            },
        ),
        ComponentEntry::new(
            id("rate"),
            Component::TextField {
                label: TextContent::literal("Annual rate (%)"),
                text: path("annualRate"),
            },
        ),
        ComponentEntry::new(
            id("years"),
            Component::TextField {
                label: TextContent::literal("Term (years)"),
                text: path("years"),
            },
        ),
        ComponentEntry::new(
            id("monthly_label"),
            Component::text(TextContent::literal("Monthly payment ($)")),
        ),
        ComponentEntry::new(id("monthly_value"), Component::text(path("monthlyPayment"))),
        ComponentEntry::new(
            id("monthly_row"),
            Component::row(vec![id("monthly_label"), id("monthly_value")]),
        ),
        ComponentEntry::new(
            id("interest_label"),
            Component::text(TextContent::literal("Total interest ($)")),
        ),
        ComponentEntry::new(id("interest_value"), Component::text(path("totalInterest"))),
        ComponentEntry::new(
            id("interest_row"),
            Component::row(vec![id("interest_label"), id("interest_value")]),
        ),
        ComponentEntry::new(
            id("recalc_label"),
            Component::text(TextContent::literal("Recalculate")),
        ),
        ComponentEntry::new(
            id("recalc"),
            Component::Button {
                action: Action {
                    name: "recalculate".to_string(),
                    context: vec![
                        ActionContext {
                            key: "principal".to_string(),
                            value: path("principal"),
                        },
                        ActionContext {
                            key: "annualRate".to_string(),
                            value: path("annualRate"),
                        },
                        ActionContext {
                            key: "years".to_string(),
                            value: path("years"),
                        },
                    ],
                },
                child: id("recalc_label"),
            },
        ),
        ComponentEntry::new(
            id("card"),
            Component::column(vec![
                id("title"),
                id("principal"),
                id("rate"),
                id("years"),
                id("monthly_row"),
                id("interest_row"),
                id("recalc"),
            ]),
        ),
    ];

    let data_model = vec![DataModelEntry::new(
        namespace,
        vec![
            ("principal", format!("{principal}")),
            ("annualRate", format!("{annual_rate}")),
            ("years", format!("{years}")),
            ("monthlyPayment", format!("{monthly:.2}")),
            ("totalPayment", format!("{total:.2}")),
            ("totalInterest", format!("{interest:.2}")),
        ],
    )];

    Fragment {
        surface_id: "loan".to_string(),
        components,
        data_model,
        root: id("card"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::services::tools::ToolReply;
    use crate::server::surface::validate_fragment;
    use std::collections::HashSet;

    #[test]
    fn standard_mortgage_payment() {
        // 100k at 6% over 30 years.
        let monthly = monthly_payment(100_000.0, 6.0, 360);
        assert!((monthly - 599.55).abs() < 0.01, "got {monthly}");
    }

    #[test]
    fn zero_rate_divides_evenly() {
        let monthly = monthly_payment(12_000.0, 0.0, 120);
        assert!((monthly - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_term_degrades_to_text() {
        let outcome = LoanCalculator.calculate(1000.0, 5.0, 0, true);
        assert!(matches!(outcome.reply, ToolReply::Text(_)));
    }

    #[test]
    fn oversized_term_degrades_to_text() {
        // A saturated coercion must not overflow the month arithmetic.
        let outcome = LoanCalculator.calculate(1000.0, 5.0, u32::MAX, true);
        match outcome.reply {
            ToolReply::Text(text) => assert!(text.contains("between 1 and")),
            ToolReply::Surface(_) => panic!("expected text reply"),
        }
    }

    #[test]
    fn text_mode_skips_the_card() {
        let outcome = LoanCalculator.calculate(50_000.0, 4.5, 10, false);
        match outcome.reply {
            ToolReply::Text(text) => assert!(text.starts_with("Monthly payment: $")),
            ToolReply::Surface(_) => panic!("expected text reply"),
        }
        assert!(!outcome.context.is_empty());
    }

    #[test]
    fn card_is_well_formed() {
        let outcome = LoanCalculator.calculate(100_000.0, 6.0, 30, true);
        let ToolReply::Surface(fragment) = outcome.reply else {
            panic!("expected surface reply");
        };
        validate_fragment(&fragment).unwrap();
    }

    #[test]
    fn every_bound_path_resolves_in_the_data_model() {
        let outcome = LoanCalculator.calculate(100_000.0, 6.0, 30, true);
        let ToolReply::Surface(fragment) = outcome.reply else {
            panic!("expected surface reply");
        };

        let mut known: HashSet<String> = HashSet::new();
        for entry in &fragment.data_model {
            for value in &entry.value_map {
                known.insert(format!("{}.{}", entry.key, value.key));
            }
        }

        let mut check = |content: &TextContent| {
            if let TextContent::Path(path) = content {
                assert!(known.contains(path), "unresolved path {path}");
            }
        };
        for entry in &fragment.components {
            match &entry.component {
                Component::Text { text, .. } => check(text),
                Component::TextField { label, text } => {
                    check(label);
                    check(text);
                }
                Component::Button { action, .. } => {
                    for item in &action.context {
                        check(&item.value);
                    }
                }
                _ => {}
            }
        }
    }
}
