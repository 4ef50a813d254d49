//! Budget extraction.
//!
//! [`extract_budget`] turns free text into a [`BudgetRange`]. It runs in two
//! passes:
//!
//! 1. [`parse_budget`] scans the text once into a [`BudgetScan`] and then
//!    evaluates [`BUDGET_RULES`] first-match-wins.
//! 2. [`correct_budget_words`] repairs single bounds that point the wrong way
//!    ("über 800" must be a floor even when a generic rule produced a ceiling).
//!
//! The extractor never fails. Missing information is expressed as unset
//! bounds, ambiguity as `is_ambiguous` plus a note.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::BudgetRange;
use crate::normalize::{contains_any, normalize, pad};
use crate::rules::{first_match, Rule};
use crate::vocab::{
    APPROX_WORDS, BETWEEN_WORDS, BUDGET_WORDS, CHEAP_WORDS, CURRENCY_WORDS, NEGATED_OVER_PHRASES,
    OVER_WORDS, SMALL_BUDGET_PHRASES, UNDER_WORDS, UNIT_WORDS,
};

/// Thousands-separated amounts first ("1.000", "1.299,00"), then plain
/// numbers with an optional two-digit decimal part ("34,50").
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:\.\d{3})+(?:,\d{1,2})?|\d+(?:[.,]\d{1,2})?").unwrap());

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d{1,2})?)\s*(?:-|–|—|bis|to|and|und)\s*(\d+(?:[.,]\d{1,2})?)").unwrap()
});

static RANGE_RE_NO_CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:[.,]\d{1,2})?\s*(?:-|–|—|bis|to)\s*\d+(?:[.,]\d{1,2})?").unwrap()
});

/// Numbers at or below this value are treated as counts, not prices, when
/// nothing else marks them as money.
const SMALL_NUMBER_LIMIT: f64 = 5.0;

/// Everything the budget rules look at, gathered in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetScan {
    /// Price-like numbers in text order.
    pub numbers: Vec<f64>,
    /// Numbers next to a unit word ("55 Zoll").
    pub ignored: Vec<f64>,
    /// Explicit "X-Y" / "X bis Y" / "X and Y" pair.
    pub range_pair: Option<(f64, f64)>,
    pub has_currency: bool,
    pub has_budget_word: bool,
    pub has_under: bool,
    pub has_over: bool,
    pub has_between: bool,
    pub has_approx: bool,
    pub has_cheap: bool,
    pub has_small_budget: bool,
}

impl BudgetScan {
    /// Currency or an explicit budget word.
    fn has_money_context(&self) -> bool {
        self.has_currency || self.has_budget_word
    }

    /// Any wording that marks numbers as prices.
    fn has_any_context(&self) -> bool {
        self.has_money_context()
            || self.has_under
            || self.has_over
            || self.has_between
            || self.has_approx
            || self.range_pair.is_some()
    }

    fn max_number(&self) -> Option<f64> {
        self.numbers.iter().copied().reduce(f64::max)
    }

    fn min_number(&self) -> Option<f64> {
        self.numbers.iter().copied().reduce(f64::min)
    }
}

/// Result of one budget rule, before notes about ignored numbers are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetOutcome {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub is_ambiguous: bool,
    pub note: Option<String>,
}

impl BudgetOutcome {
    fn ambiguous(note: &str) -> Self {
        Self {
            is_ambiguous: true,
            note: Some(note.to_string()),
            ..Default::default()
        }
    }

    fn bounds(min_price: Option<f64>, max_price: Option<f64>, note: String) -> Self {
        Self {
            min_price,
            max_price,
            is_ambiguous: false,
            note: Some(note),
        }
    }
}

/// Parse a price written with German or English separators: "1.299,00",
/// "1,299.00", "34,50", "1.000" and plain "390" all work.
pub fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim().trim_end_matches('€').trim_end();
    let cleaned = match (raw.rfind(','), raw.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(_), None) => raw.replace(',', "."),
        (None, Some(_)) if raw.split('.').skip(1).all(|g| g.len() == 3) => raw.replace('.', ""),
        _ => raw.to_string(),
    };
    cleaned.parse::<f64>().ok()
}

fn is_unit_word(word: &str) -> bool {
    let suffix = word.trim_start_matches(|c: char| c.is_ascii_digit());
    UNIT_WORDS.contains(&suffix)
}

/// Mark the token positions whose numbers are sizes.
///
/// A unit word attaches to the nearest number within two tokens, preferring
/// the one before it ("55 Zoll unter 600" only sizes the 55).
fn size_positions(raw_tokens: &[&str]) -> Vec<bool> {
    let number_positions: Vec<usize> = raw_tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| NUMBER_RE.is_match(t))
        .map(|(i, _)| i)
        .collect();
    let mut sized = vec![false; raw_tokens.len()];

    for (u, raw) in raw_tokens.iter().enumerate() {
        let token = normalize(raw);
        let has_unit = raw.contains('"') || token.split(' ').any(is_unit_word);
        if !has_unit {
            continue;
        }
        if number_positions.contains(&u) {
            sized[u] = true;
            continue;
        }
        let before = number_positions
            .iter()
            .rev()
            .find(|&&p| p < u && u - p <= 2);
        let after = number_positions.iter().find(|&&p| p > u && p - u <= 2);
        if let Some(&p) = before.or(after) {
            sized[p] = true;
        }
    }
    sized
}

/// An approximation word within two tokens before a number ("ca. 300",
/// "um die 300"). "what about snowboards under 300" does not count.
fn has_approx_before_number(normalized: &str) -> bool {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.iter().enumerate().any(|(i, token)| {
        token.trim_start_matches('€').starts_with(|c: char| c.is_ascii_digit())
            && contains_any(&pad(&tokens[i.saturating_sub(2)..i].join(" ")), APPROX_WORDS)
    })
}

pub fn format_price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Tokenize and classify everything price-related in `text`.
pub fn scan_budget(text: &str) -> BudgetScan {
    let lowered = text.to_lowercase();
    let normalized = normalize(&lowered);
    let padded = pad(&normalized);
    // "nicht mehr als 50" sets a ceiling even though it contains "mehr als".
    let over_scan = NEGATED_OVER_PHRASES
        .iter()
        .fold(padded.clone(), |acc, phrase| {
            acc.replace(&format!(" {} ", phrase), " ")
        });

    let raw_tokens: Vec<&str> = lowered.split_whitespace().collect();
    let sized = size_positions(&raw_tokens);

    let mut numbers = Vec::new();
    let mut ignored = Vec::new();
    for (i, raw) in raw_tokens.iter().enumerate() {
        for m in NUMBER_RE.find_iter(raw) {
            // Digits after letters in the same token belong to a model code
            // ("xr500", "rtx-4090").
            if raw[..m.start()].chars().any(char::is_alphabetic) {
                continue;
            }
            if let Some(value) = parse_price(m.as_str()) {
                if sized[i] {
                    ignored.push(value);
                } else {
                    numbers.push(value);
                }
            }
        }
    }

    let range_pair = RANGE_RE.captures(&lowered).and_then(|caps| {
        let a = parse_price(caps.get(1)?.as_str())?;
        let b = parse_price(caps.get(2)?.as_str())?;
        // Both ends must be prices, not sizes.
        (numbers.contains(&a) && numbers.contains(&b)).then_some((a, b))
    });
    // "and"/"und" only join a pair after "zwischen"/"between".
    let has_between = contains_any(&padded, BETWEEN_WORDS);
    let range_pair =
        range_pair.filter(|_| has_between || RANGE_RE_NO_CONJUNCTION.is_match(&lowered));

    BudgetScan {
        numbers,
        ignored,
        range_pair,
        has_currency: contains_any(&padded, CURRENCY_WORDS) || lowered.contains('€'),
        has_budget_word: contains_any(&padded, BUDGET_WORDS),
        has_under: contains_any(&padded, UNDER_WORDS),
        has_over: contains_any(&over_scan, OVER_WORDS),
        has_between,
        has_approx: has_approx_before_number(&normalized),
        has_cheap: contains_any(&padded, CHEAP_WORDS),
        has_small_budget: contains_any(&padded, SMALL_BUDGET_PHRASES),
    }
}

/// Ordered budget rules; the first matching rule decides the bounds.
pub static BUDGET_RULES: &[Rule<BudgetScan, BudgetOutcome>] = &[
    Rule {
        name: "no-numbers-vague-budget",
        when: |s| {
            s.numbers.is_empty()
                && (s.has_money_context() || s.has_cheap || s.has_small_budget)
        },
        then: |_| BudgetOutcome::ambiguous("budget wording without an amount; ask for a figure"),
    },
    Rule {
        name: "no-numbers",
        when: |s| s.numbers.is_empty(),
        then: |_| BudgetOutcome::default(),
    },
    Rule {
        name: "small-numbers-without-context",
        when: |s| {
            s.numbers.iter().all(|n| *n <= SMALL_NUMBER_LIMIT) && !s.has_any_context()
        },
        then: |_| BudgetOutcome::ambiguous("only small numbers without price context"),
    },
    Rule {
        name: "approximate",
        when: |s| s.has_approx,
        then: |s| {
            let center = s.max_number().unwrap_or_default();
            let low = ((center * 0.8) * 100.0).round() / 100.0;
            let high = ((center * 1.2) * 100.0).round() / 100.0;
            BudgetOutcome::bounds(
                Some(low.floor()),
                Some(high.ceil()),
                format!("approximate budget around {}", format_price(center)),
            )
        },
    },
    Rule {
        name: "range",
        when: |s| s.range_pair.is_some() || (s.has_between && s.numbers.len() >= 2),
        then: |s| {
            let (lo, hi) = match s.range_pair {
                Some((a, b)) => (a.min(b), a.max(b)),
                None => (
                    s.min_number().unwrap_or_default(),
                    s.max_number().unwrap_or_default(),
                ),
            };
            BudgetOutcome::bounds(
                Some(lo),
                Some(hi),
                format!("price range {}-{}", format_price(lo), format_price(hi)),
            )
        },
    },
    Rule {
        name: "ceiling-wording",
        when: |s| s.has_under,
        then: |s| {
            let max = s.max_number().unwrap_or_default();
            BudgetOutcome::bounds(None, Some(max), format!("ceiling {}", format_price(max)))
        },
    },
    Rule {
        name: "floor-wording",
        when: |s| s.has_over,
        then: |s| {
            let min = s.max_number().unwrap_or_default();
            BudgetOutcome::bounds(Some(min), None, format!("floor {}", format_price(min)))
        },
    },
    Rule {
        name: "single-amount",
        when: |s| s.numbers.len() == 1 && s.has_money_context(),
        then: |s| {
            let value = s.numbers[0];
            if value <= SMALL_NUMBER_LIMIT && !s.has_currency {
                BudgetOutcome::ambiguous("small amount without currency")
            } else {
                BudgetOutcome::bounds(
                    None,
                    Some(value),
                    format!("single amount {} read as ceiling", format_price(value)),
                )
            }
        },
    },
    Rule {
        name: "two-amounts",
        when: |s| s.numbers.len() == 2 && s.has_money_context(),
        then: |s| {
            let lo = s.numbers[0].min(s.numbers[1]);
            let hi = s.numbers[0].max(s.numbers[1]);
            BudgetOutcome::bounds(
                Some(lo),
                Some(hi),
                format!("two amounts read as range {}-{}", format_price(lo), format_price(hi)),
            )
        },
    },
    Rule {
        name: "many-amounts",
        when: |s| s.numbers.len() > 2 && s.has_money_context(),
        then: |s| {
            let max = s.max_number().unwrap_or_default();
            BudgetOutcome::bounds(
                None,
                Some(max),
                format!("several amounts; largest {} read as ceiling", format_price(max)),
            )
        },
    },
    Rule {
        name: "cheap-wording-only",
        when: |s| s.has_cheap,
        then: |_| {
            BudgetOutcome::ambiguous("cheap wording without explicit budget; prefer cheapest items")
        },
    },
    Rule {
        name: "numbers-without-context",
        when: |_| true,
        then: |_| BudgetOutcome::ambiguous("numbers without budget or currency context"),
    },
];

/// First pass: scan the text and apply [`BUDGET_RULES`].
pub fn parse_budget(text: &str) -> BudgetRange {
    let scan = scan_budget(text);
    let mut notes = Vec::new();
    if !scan.ignored.is_empty() {
        let list: Vec<String> = scan.ignored.iter().map(|n| format_price(*n)).collect();
        notes.push(format!("ignored size numbers: {}", list.join(", ")));
    }

    let outcome = match first_match(BUDGET_RULES, &scan) {
        Some(fired) => {
            debug!(rule = fired.rule, numbers = ?scan.numbers, "budget rule fired");
            fired.outcome
        }
        None => BudgetOutcome::default(),
    };
    notes.extend(outcome.note);

    let mut range = BudgetRange {
        min_price: outcome.min_price,
        max_price: outcome.max_price,
        has_budget_word: scan.has_money_context()
            || scan.has_under
            || scan.has_over
            || scan.has_between,
        is_ambiguous: outcome.is_ambiguous,
        notes,
    };
    enforce_order(&mut range);
    range
}

fn enforce_order(range: &mut BudgetRange) {
    if let (Some(lo), Some(hi)) = (range.min_price, range.max_price) {
        if lo > hi {
            range.min_price = Some(hi);
            range.max_price = Some(lo);
            range.notes.push("swapped inverted bounds".to_string());
        }
    }
}

/// Second pass: move a lone bound to the side the wording asks for.
pub fn correct_budget_words(text: &str, mut range: BudgetRange) -> BudgetRange {
    let padded = pad(&normalize(text));
    let over_scan = NEGATED_OVER_PHRASES
        .iter()
        .fold(padded.clone(), |acc, phrase| {
            acc.replace(&format!(" {} ", phrase), " ")
        });
    let explicit_over = contains_any(&over_scan, OVER_WORDS);
    let explicit_under = contains_any(&padded, UNDER_WORDS);

    match (range.min_price, range.max_price) {
        (None, Some(max)) if explicit_over && !explicit_under => {
            range.min_price = Some(max);
            range.max_price = None;
            range.notes.push("floor wording: ceiling moved to floor".to_string());
        }
        (Some(min), None) if explicit_under && !explicit_over => {
            range.max_price = Some(min);
            range.min_price = None;
            range.notes.push("ceiling wording: floor moved to ceiling".to_string());
        }
        _ => {}
    }
    range
}

/// Extract a budget from free text. Total: never fails.
pub fn extract_budget(text: &str) -> BudgetRange {
    correct_budget_words(text, parse_budget(text))
}

/// "Cheap" or ceiling wording, regardless of numbers.
pub fn has_ceiling_wording(text: &str) -> bool {
    let padded = pad(&normalize(text));
    contains_any(&padded, UNDER_WORDS) || contains_any(&padded, CHEAP_WORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_sets_ceiling() {
        let b = extract_budget("under 20 euros");
        assert_eq!(b.min_price, None);
        assert_eq!(b.max_price, Some(20.0));
        assert!(b.has_budget_word);
        assert!(!b.is_ambiguous);
    }

    #[test]
    fn test_between_is_order_independent() {
        let a = extract_budget("between 600 and 900");
        let b = extract_budget("zwischen 900 und 600 euro");
        for r in [a, b] {
            assert_eq!(r.min_price, Some(600.0));
            assert_eq!(r.max_price, Some(900.0));
        }
    }

    #[test]
    fn test_dash_range() {
        let r = extract_budget("Fernseher 300-500");
        assert_eq!((r.min_price, r.max_price), (Some(300.0), Some(500.0)));
        let r = extract_budget("von 100 bis 250 €");
        assert_eq!((r.min_price, r.max_price), (Some(100.0), Some(250.0)));
    }

    #[test]
    fn test_over_sets_floor() {
        let r = extract_budget("Snowboard über 800 Euro");
        assert_eq!((r.min_price, r.max_price), (Some(800.0), None));
        let r = extract_budget("at least 50 bucks");
        assert_eq!((r.min_price, r.max_price), (Some(50.0), None));
    }

    #[test]
    fn test_negated_over_is_ceiling() {
        let r = extract_budget("nicht mehr als 40 euro");
        assert_eq!((r.min_price, r.max_price), (None, Some(40.0)));
    }

    #[test]
    fn test_approximate_budget() {
        let r = extract_budget("so circa 100 euro");
        assert_eq!((r.min_price, r.max_price), (Some(80.0), Some(120.0)));
        let r = extract_budget("around 55 dollars");
        assert_eq!((r.min_price, r.max_price), (Some(44.0), Some(66.0)));
    }

    #[test]
    fn test_approx_word_away_from_number_is_ignored() {
        let r = extract_budget("what about snowboards under 300 euro");
        assert_eq!((r.min_price, r.max_price), (None, Some(300.0)));
        let r = extract_budget("ungefähr so 300 euro");
        assert_eq!((r.min_price, r.max_price), (Some(240.0), Some(360.0)));
    }

    #[test]
    fn test_single_amount_with_currency_is_ceiling() {
        let r = extract_budget("ich habe 150€");
        assert_eq!((r.min_price, r.max_price), (None, Some(150.0)));
        let r = extract_budget("mein Budget ist 70");
        assert_eq!((r.min_price, r.max_price), (None, Some(70.0)));
    }

    #[test]
    fn test_two_amounts_with_context() {
        let r = extract_budget("budget 90 or 40");
        assert_eq!((r.min_price, r.max_price), (Some(40.0), Some(90.0)));
    }

    #[test]
    fn test_unit_numbers_are_ignored() {
        let r = extract_budget("Fernseher 55 Zoll unter 600 Euro");
        assert_eq!(r.max_price, Some(600.0));
        assert!(r.notes.iter().any(|n| n.contains("55")));

        let r = extract_budget("65 inch tv");
        assert!(!r.has_bounds());
    }

    #[test]
    fn test_small_numbers_are_ambiguous() {
        let r = extract_budget("3x LED Lampe");
        assert!(r.is_ambiguous);
        assert!(!r.has_bounds());
        let r = extract_budget("1TB festplatte");
        assert!(r.is_ambiguous);
        assert!(!r.has_bounds());
    }

    #[test]
    fn test_small_amount_without_currency_is_ambiguous() {
        let r = extract_budget("preis 3");
        assert!(r.is_ambiguous);
        assert_eq!(r.max_price, None);
    }

    #[test]
    fn test_cheap_wording_does_not_set_ceiling() {
        let r = extract_budget("something cheap, maybe 2");
        assert!(r.is_ambiguous);
        assert!(!r.has_bounds());
        let r = extract_budget("günstige Jacke 30");
        assert!(r.is_ambiguous);
        assert_eq!(r.max_price, None);
    }

    #[test]
    fn test_vague_budget_without_numbers() {
        let r = extract_budget("ich habe nur ein kleines Budget");
        assert!(r.is_ambiguous);
        assert!(!r.has_bounds());
        let r = extract_budget("zeig mir jacken");
        assert!(!r.is_ambiguous);
        assert!(!r.has_bounds());
    }

    #[test]
    fn test_decimal_and_thousands() {
        let r = extract_budget("unter 34,50 euro");
        assert_eq!(r.max_price, Some(34.5));
        let r = extract_budget("bis 1.500 euro");
        assert_eq!(r.max_price, Some(1500.0));
    }

    #[test]
    fn test_parse_price_separators() {
        assert_eq!(parse_price("1.299,00"), Some(1299.0));
        assert_eq!(parse_price("1,299.00"), Some(1299.0));
        assert_eq!(parse_price("34,50 €"), Some(34.5));
        assert_eq!(parse_price("1.000"), Some(1000.0));
        assert_eq!(parse_price("12.5"), Some(12.5));
        assert_eq!(parse_price("cheap"), None);

        let r = extract_budget("unter 1.299,00 euro");
        assert_eq!(r.max_price, Some(1299.0));
    }

    #[test]
    fn test_model_code_digits_are_not_prices() {
        let r = extract_budget("xr500 unter 50 euro");
        assert_eq!((r.min_price, r.max_price), (None, Some(50.0)));
        let r = extract_budget("xr-500 unter 50 euro");
        assert_eq!((r.min_price, r.max_price), (None, Some(50.0)));
        // "4090 bis 100" is not a range when 4090 belongs to the code.
        let r = extract_budget("rtx-4090 bis 100 euro");
        assert_eq!((r.min_price, r.max_price), (None, Some(100.0)));
    }

    #[test]
    fn test_numbers_without_context_are_ambiguous() {
        let r = extract_budget("iphone 15 pro");
        assert!(r.is_ambiguous);
        assert!(!r.has_bounds());
    }

    #[test]
    fn test_correction_moves_bounds() {
        let r = BudgetRange {
            max_price: Some(800.0),
            ..Default::default()
        };
        let r = correct_budget_words("über 800", r);
        assert_eq!((r.min_price, r.max_price), (Some(800.0), None));

        let r = BudgetRange {
            min_price: Some(25.0),
            ..Default::default()
        };
        let r = correct_budget_words("unter 25", r);
        assert_eq!((r.min_price, r.max_price), (None, Some(25.0)));
    }

    #[test]
    fn test_bounds_always_ordered() {
        for text in [
            "zwischen 900 und 100",
            "700-200 euro",
            "budget 5000 oder 20",
            "circa 10 euro",
            "between 1 and 9999 dollars",
        ] {
            let r = extract_budget(text);
            if let (Some(lo), Some(hi)) = (r.min_price, r.max_price) {
                assert!(lo <= hi, "{}: {} > {}", text, lo, hi);
            }
        }
    }

    #[test]
    fn test_empty_input_is_total() {
        let r = extract_budget("");
        assert_eq!(r, BudgetRange::default());
        let r = extract_budget("?!?");
        assert!(!r.has_bounds());
    }

    #[test]
    fn test_ceiling_wording() {
        assert!(has_ceiling_wording("something cheap"));
        assert!(has_ceiling_wording("unter 3000"));
        assert!(!has_ceiling_wording("über 3000"));
    }
}
