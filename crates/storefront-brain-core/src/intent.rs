//! Intent classification and special request phrasing.
//!
//! Five keyword tables are checked in fixed priority order (premium, bargain,
//! gift, bundle, explore); the first with a hit decides. Without a hit the
//! previous turn's intent carries over, else [`Intent::QuickBuy`].

use serde::Serialize;

use crate::alias::content_terms;
use crate::models::Intent;
use crate::normalize::{contains_any, normalize, pad};
use crate::rules::{first_match, Rule};
use crate::vocab::{
    BARGAIN_WORDS, BUNDLE_WORDS, CHEAPEST_PATTERNS, EXPLAIN_INGREDIENT_WORDS,
    EXPLAIN_USAGE_WORDS, EXPLAIN_WASHING_WORDS, EXPLORE_WORDS, GIFT_WORDS,
    MOST_EXPENSIVE_PATTERNS, PREMIUM_NEGATIONS, PREMIUM_WORDS, SHOW_ME_PATTERNS,
};

/// Content words allowed after "show me" for the request to count as a
/// specific quick buy.
const SHOW_ME_MAX_WORDS: usize = 4;

pub static INTENT_RULES: &[Rule<String, Intent>] = &[
    Rule {
        name: "premium",
        when: |p| contains_any(p, PREMIUM_WORDS) && !contains_any(p, PREMIUM_NEGATIONS),
        then: |_| Intent::Premium,
    },
    Rule {
        name: "bargain",
        when: |p| contains_any(p, BARGAIN_WORDS),
        then: |_| Intent::Bargain,
    },
    Rule {
        name: "gift",
        when: |p| contains_any(p, GIFT_WORDS),
        then: |_| Intent::Gift,
    },
    Rule {
        name: "bundle",
        when: |p| contains_any(p, BUNDLE_WORDS),
        then: |_| Intent::Bundle,
    },
    Rule {
        name: "explore",
        when: |p| contains_any(p, EXPLORE_WORDS),
        then: |_| Intent::Explore,
    },
];

/// "Show me <1-4 content words>" is a specific request, not browsing.
fn is_specific_show_me(normalized: &str) -> bool {
    SHOW_ME_PATTERNS.iter().any(|pattern| {
        normalized
            .strip_prefix(pattern)
            .filter(|rest| rest.is_empty() || rest.starts_with(' '))
            .map(|rest| {
                let n = content_terms(rest).len();
                (1..=SHOW_ME_MAX_WORDS).contains(&n)
            })
            .unwrap_or(false)
    })
}

pub fn classify_intent(text: &str, previous: Option<Intent>) -> Intent {
    let normalized = normalize(text);
    let padded = pad(&normalized);
    match first_match(INTENT_RULES, &padded).map(|f| f.outcome) {
        Some(Intent::Explore) if is_specific_show_me(&normalized) => Intent::QuickBuy,
        Some(intent) => intent,
        None => previous.unwrap_or_default(),
    }
}

/// "The cheapest one", "am günstigsten".
pub fn wants_cheapest(text: &str) -> bool {
    contains_any(&pad(&normalize(text)), CHEAPEST_PATTERNS)
}

/// "The most expensive", "das teuerste".
pub fn wants_most_expensive(text: &str) -> bool {
    contains_any(&pad(&normalize(text)), MOST_EXPENSIVE_PATTERNS)
}

/// What a follow-up question wants explained about the previous
/// recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainMode {
    Usage,
    Ingredients,
    Washing,
}

impl ExplainMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplainMode::Usage => "usage",
            ExplainMode::Ingredients => "ingredients",
            ExplainMode::Washing => "washing",
        }
    }
}

/// Detect a question about the previously shown products. Bargain wording
/// means the customer wants new products, so it disables explanation mode.
pub fn detect_explanation(text: &str) -> Option<ExplainMode> {
    let padded = pad(&normalize(text));
    if contains_any(&padded, BARGAIN_WORDS) {
        return None;
    }
    [
        (EXPLAIN_INGREDIENT_WORDS, ExplainMode::Ingredients),
        (EXPLAIN_USAGE_WORDS, ExplainMode::Usage),
        (EXPLAIN_WASHING_WORDS, ExplainMode::Washing),
    ]
    .into_iter()
    .find(|(table, _)| contains_any(&padded, table))
    .map(|(_, mode)| mode)
}
