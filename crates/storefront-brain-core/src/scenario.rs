//! Reply scenario selection.
//!
//! The reply layer picks a template per [`Scenario`]; this module only
//! decides which one. Rules are evaluated first-match-wins.

use serde::Serialize;

use crate::models::Intent;
use crate::rules::{first_match, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    ExplainProduct,
    ExplainBudgetMismatch,
    NoResults,
    AskClarification,
    AskBudget,
    CheapestSingle,
    MostExpensiveSingle,
    ShowProducts,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::ExplainProduct => "explain_product",
            Scenario::ExplainBudgetMismatch => "explain_budget_mismatch",
            Scenario::NoResults => "no_results",
            Scenario::AskClarification => "ask_clarification",
            Scenario::AskBudget => "ask_budget",
            Scenario::CheapestSingle => "cheapest_single",
            Scenario::MostExpensiveSingle => "most_expensive_single",
            Scenario::ShowProducts => "show_products",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioInput {
    pub intent: Intent,
    pub result_count: usize,
    pub has_budget: bool,
    pub budget_ambiguous: bool,
    pub has_attribute_terms: bool,
    pub explaining: bool,
    pub price_range_no_match: bool,
    pub needs_ai_help: bool,
    pub cheapest_single: bool,
    pub most_expensive_single: bool,
}

pub static SCENARIO_RULES: &[Rule<ScenarioInput, Scenario>] = &[
    Rule {
        name: "explain-product",
        when: |s| s.explaining,
        then: |_| Scenario::ExplainProduct,
    },
    Rule {
        name: "budget-mismatch",
        when: |s| s.price_range_no_match,
        then: |_| Scenario::ExplainBudgetMismatch,
    },
    Rule {
        name: "no-results",
        when: |s| s.result_count == 0,
        then: |_| Scenario::NoResults,
    },
    Rule {
        name: "needs-help",
        when: |s| s.needs_ai_help,
        then: |_| Scenario::AskClarification,
    },
    Rule {
        name: "bargain-without-budget",
        when: |s| s.intent == Intent::Bargain && s.budget_ambiguous && !s.has_budget,
        then: |_| Scenario::AskBudget,
    },
    Rule {
        name: "cheapest",
        when: |s| s.cheapest_single,
        then: |_| Scenario::CheapestSingle,
    },
    Rule {
        name: "most-expensive",
        when: |s| s.most_expensive_single,
        then: |_| Scenario::MostExpensiveSingle,
    },
];

pub fn classify_scenario(input: &ScenarioInput) -> Scenario {
    first_match(SCENARIO_RULES, input)
        .map(|fired| fired.outcome)
        .unwrap_or(Scenario::ShowProducts)
}
