//! Escalation decision: should the rule engine hand this query to an AI
//! assistant?
//!
//! [`ESCALATION_RULES`] is evaluated first-match-wins. Unknown terms that
//! are strongly resolved (some resolved token of three or more characters)
//! do not count as unknown here.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::catalog::PriceBounds;
use crate::models::BudgetRange;
use crate::normalize::normalize_key;
use crate::rules::{first_match, Rule};
use crate::settings::EngineSettings;
use crate::vocab::BUDGET_STOPWORDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EscalationReason {
    #[serde(rename = "unknown-terms-with-budget")]
    UnknownTermsWithBudget,
    #[serde(rename = "budget_very_low")]
    BudgetVeryLow,
    #[serde(rename = "budget-clear-no-ai")]
    BudgetClearNoAi,
    #[serde(rename = "suspicious-budget-unknown-term")]
    SuspiciousBudgetUnknownTerm,
    #[serde(rename = "unknown_product_with_budget")]
    UnknownProductWithBudget,
    #[serde(rename = "unknown_terms")]
    UnknownTerms,
    #[serde(rename = "price-range-no-match")]
    PriceRangeNoMatch,
    #[default]
    #[serde(rename = "none")]
    None,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::UnknownTermsWithBudget => "unknown-terms-with-budget",
            EscalationReason::BudgetVeryLow => "budget_very_low",
            EscalationReason::BudgetClearNoAi => "budget-clear-no-ai",
            EscalationReason::SuspiciousBudgetUnknownTerm => "suspicious-budget-unknown-term",
            EscalationReason::UnknownProductWithBudget => "unknown_product_with_budget",
            EscalationReason::UnknownTerms => "unknown_terms",
            EscalationReason::PriceRangeNoMatch => "price-range-no-match",
            EscalationReason::None => "none",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EscalationSignal {
    pub needs_ai_help: bool,
    pub reason: EscalationReason,
    pub unknown_terms: Vec<String>,
    pub code_term: Option<String>,
}

/// Everything the escalation rules look at.
#[derive(Debug, Clone, Default)]
pub struct EscalationInput {
    pub budget: BudgetRange,
    /// Price bounds of the effective category (or the catalog).
    pub bounds: Option<PriceBounds>,
    pub unknown_terms: Vec<String>,
    pub resolved_terms: Vec<String>,
    pub strong_resolution: bool,
    pub has_category_match: bool,
    pub price_range_no_match: bool,
    /// "cheap"/"under" wording present.
    pub ceiling_wording: bool,
    pub code_term: Option<String>,
    pub settings: EngineSettings,
}

impl EscalationInput {
    /// Unknown terms that count: budget vocabulary removed, and nothing at
    /// all when the terms were strongly resolved.
    pub fn open_terms(&self) -> Vec<String> {
        if self.strong_resolution {
            return Vec::new();
        }
        self.unknown_terms
            .iter()
            .filter(|t| !BUDGET_STOPWORDS.contains(&t.as_str()))
            .cloned()
            .collect()
    }

    fn has_open_terms(&self) -> bool {
        !self.open_terms().is_empty()
    }

    fn ceiling(&self) -> Option<f64> {
        self.budget.max_price
    }

    fn signal(&self, needs_ai_help: bool, reason: EscalationReason) -> EscalationSignal {
        EscalationSignal {
            needs_ai_help,
            reason,
            unknown_terms: self.open_terms(),
            code_term: self.code_term.clone(),
        }
    }
}

pub static ESCALATION_RULES: &[Rule<EscalationInput, EscalationSignal>] = &[
    Rule {
        name: "unknown-terms-with-budget",
        when: |i| i.has_open_terms() && i.budget.has_bounds(),
        then: |i| i.signal(true, EscalationReason::UnknownTermsWithBudget),
    },
    Rule {
        name: "budget-very-low",
        when: |i| match (i.ceiling(), i.bounds) {
            (Some(max), Some(b)) => {
                max < b.min && max * i.settings.very_low_budget_ratio <= b.min
            }
            _ => false,
        },
        then: |i| i.signal(true, EscalationReason::BudgetVeryLow),
    },
    Rule {
        name: "budget-clear",
        when: |i| match (i.ceiling(), i.bounds) {
            (Some(max), Some(b)) => {
                !i.has_open_terms() && max >= b.max * i.settings.budget_clear_ratio
            }
            _ => false,
        },
        then: |i| i.signal(false, EscalationReason::BudgetClearNoAi),
    },
    Rule {
        name: "suspicious-budget",
        when: |i| {
            i.ceiling()
                .is_some_and(|max| max >= i.settings.suspicious_budget_threshold)
                && (i.ceiling_wording || !i.unknown_terms.is_empty())
        },
        then: |i| i.signal(true, EscalationReason::SuspiciousBudgetUnknownTerm),
    },
    Rule {
        name: "unknown-product-with-budget",
        when: |i| i.code_term.is_some() && i.budget.has_bounds(),
        then: |i| i.signal(true, EscalationReason::UnknownProductWithBudget),
    },
    Rule {
        name: "scoped-and-resolved",
        when: |i| {
            !i.unknown_terms.is_empty() && i.has_category_match && !i.resolved_terms.is_empty()
        },
        then: |i| i.signal(false, EscalationReason::None),
    },
    Rule {
        name: "unknown-terms",
        when: |i| i.has_open_terms() && !i.budget.has_bounds() && !i.has_category_match,
        then: |i| i.signal(true, EscalationReason::UnknownTerms),
    },
    Rule {
        name: "price-range-no-match",
        when: |i| i.price_range_no_match && !i.has_open_terms(),
        then: |i| i.signal(false, EscalationReason::PriceRangeNoMatch),
    },
];

pub fn decide_escalation(input: &EscalationInput) -> EscalationSignal {
    first_match(ESCALATION_RULES, input)
        .map(|fired| {
            tracing::debug!(rule = fired.rule, "escalation rule fired");
            fired.outcome
        })
        .unwrap_or_else(|| input.signal(false, EscalationReason::None))
}

const CODE_TERM_LEN: std::ops::RangeInclusive<usize> = 4..=20;

/// A token that looks like a model number or SKU ("xr500", "ab-12") and is
/// not a catalog token.
pub fn detect_code_term(text: &str, known: &BTreeSet<String>) -> Option<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .find(|t| {
            let has_letter = t.chars().any(char::is_alphabetic);
            let has_digit = t.chars().any(|c| c.is_ascii_digit());
            let code_like = (has_letter && has_digit) || t.contains('-') || t.contains('_');
            CODE_TERM_LEN.contains(&t.chars().count())
                && code_like
                && !known.contains(&normalize_key(t))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rule_names;

    fn bounds(min: f64, max: f64) -> Option<PriceBounds> {
        Some(PriceBounds { min, max })
    }

    fn ceiling(max: f64) -> BudgetRange {
        BudgetRange {
            max_price: Some(max),
            has_budget_word: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            rule_names(ESCALATION_RULES),
            vec![
                "unknown-terms-with-budget",
                "budget-very-low",
                "budget-clear",
                "suspicious-budget",
                "unknown-product-with-budget",
                "scoped-and-resolved",
                "unknown-terms",
                "price-range-no-match",
            ]
        );
    }

    #[test]
    fn test_unknown_terms_with_budget_outranks_budget_rules() {
        // The ceiling alone would be "very low".
        let input = EscalationInput {
            budget: ceiling(50.0),
            bounds: bounds(300.0, 900.0),
            unknown_terms: vec!["xr500".into()],
            ..Default::default()
        };
        let signal = decide_escalation(&input);
        assert!(signal.needs_ai_help);
        assert_eq!(signal.reason, EscalationReason::UnknownTermsWithBudget);
        assert_eq!(signal.unknown_terms, vec!["xr500"]);
    }

    #[test]
    fn test_budget_very_low() {
        let input = EscalationInput {
            budget: ceiling(100.0),
            bounds: bounds(150.0, 900.0),
            ..Default::default()
        };
        assert_eq!(decide_escalation(&input).reason, EscalationReason::BudgetVeryLow);

        // Below the minimum but not by the ratio.
        let input = EscalationInput {
            budget: ceiling(120.0),
            bounds: bounds(150.0, 900.0),
            ..Default::default()
        };
        assert_eq!(decide_escalation(&input).reason, EscalationReason::None);
    }

    #[test]
    fn test_generous_budget_is_clear() {
        let input = EscalationInput {
            budget: ceiling(5000.0),
            bounds: bounds(10.0, 800.0),
            ceiling_wording: true,
            ..Default::default()
        };
        let signal = decide_escalation(&input);
        assert!(!signal.needs_ai_help);
        assert_eq!(signal.reason, EscalationReason::BudgetClearNoAi);
    }

    #[test]
    fn test_suspicious_budget() {
        let input = EscalationInput {
            budget: ceiling(2500.0),
            bounds: bounds(10.0, 3000.0),
            ceiling_wording: true,
            ..Default::default()
        };
        assert_eq!(
            decide_escalation(&input).reason,
            EscalationReason::SuspiciousBudgetUnknownTerm
        );
    }

    #[test]
    fn test_code_term_with_budget() {
        let input = EscalationInput {
            budget: ceiling(50.0),
            bounds: bounds(10.0, 90.0),
            code_term: Some("xr-500".into()),
            ..Default::default()
        };
        let signal = decide_escalation(&input);
        assert_eq!(signal.reason, EscalationReason::UnknownProductWithBudget);
        assert_eq!(signal.code_term.as_deref(), Some("xr-500"));
    }

    #[test]
    fn test_unknown_terms_without_budget() {
        let input = EscalationInput {
            unknown_terms: vec!["flux".into()],
            ..Default::default()
        };
        assert_eq!(decide_escalation(&input).reason, EscalationReason::UnknownTerms);

        // Scoped by category and resolved: no help needed.
        let input = EscalationInput {
            unknown_terms: vec!["snowbaord".into()],
            resolved_terms: vec!["snowboard".into()],
            strong_resolution: true,
            has_category_match: true,
            ..Default::default()
        };
        let signal = decide_escalation(&input);
        assert!(!signal.needs_ai_help);
        assert!(signal.unknown_terms.is_empty());
    }

    #[test]
    fn test_strong_resolution_clears_unknown() {
        let input = EscalationInput {
            budget: ceiling(50.0),
            unknown_terms: vec!["snowbaord".into()],
            resolved_terms: vec!["snowboard".into()],
            strong_resolution: true,
            ..Default::default()
        };
        assert!(!decide_escalation(&input).needs_ai_help);
    }

    #[test]
    fn test_price_range_no_match_does_not_escalate() {
        let input = EscalationInput {
            price_range_no_match: true,
            ..Default::default()
        };
        let signal = decide_escalation(&input);
        assert!(!signal.needs_ai_help);
        assert_eq!(signal.reason, EscalationReason::PriceRangeNoMatch);
    }

    #[test]
    fn test_detect_code_term() {
        let known: BTreeSet<String> = ["snowboard".to_string(), "ps5".to_string()].into();
        assert_eq!(detect_code_term("XR500 unter 50 Euro", &known).as_deref(), Some("xr500"));
        assert_eq!(detect_code_term("das xr-500?", &known).as_deref(), Some("xr-500"));
        assert_eq!(detect_code_term("snowboard unter 50€", &known), None);
        assert_eq!(detect_code_term("a 1tb disk", &known), None);
    }
}
