//! Ordered rule tables evaluated first-match-wins.
//!
//! Priority cascades (budget parsing, escalation, scenario selection) are
//! written as static slices of [`Rule`] values instead of nested branches,
//! so the order of the rules is data and can be asserted on directly.
//!
//! ```
//! use storefront_brain_core::rules::{first_match, Rule};
//!
//! static SIGN: &[Rule<i32, &str>] = &[
//!     Rule { name: "negative", when: |n| *n < 0, then: |_| "neg" },
//!     Rule { name: "zero", when: |n| *n == 0, then: |_| "zero" },
//! ];
//!
//! assert_eq!(first_match(SIGN, &-4).map(|f| f.outcome), Some("neg"));
//! assert!(first_match(SIGN, &7).is_none());
//! ```

/// One `(predicate, outcome)` pair.
pub struct Rule<C, O> {
    /// Stable identifier, used in logs and tests.
    pub name: &'static str,
    pub when: fn(&C) -> bool,
    pub then: fn(&C) -> O,
}

/// The rule that fired and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<O> {
    pub rule: &'static str,
    pub outcome: O,
}

/// Evaluate `rules` in order and return the first outcome whose predicate
/// holds.
pub fn first_match<C, O>(rules: &[Rule<C, O>], ctx: &C) -> Option<Fired<O>> {
    rules.iter().find(|r| (r.when)(ctx)).map(|r| Fired {
        rule: r.name,
        outcome: (r.then)(ctx),
    })
}

/// Names of the rules in evaluation order.
pub fn rule_names<C, O>(rules: &[Rule<C, O>]) -> Vec<&'static str> {
    rules.iter().map(|r| r.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    static BUCKETS: &[Rule<u32, u32>] = &[
        Rule {
            name: "small",
            when: |n| *n < 10,
            then: |n| *n,
        },
        Rule {
            name: "even",
            when: |n| n % 2 == 0,
            then: |n| n / 2,
        },
        Rule {
            name: "any",
            when: |_| true,
            then: |_| 0,
        },
    ];

    #[test]
    fn test_first_match_respects_order() {
        // 4 is both small and even; the earlier rule wins.
        let fired = first_match(BUCKETS, &4).unwrap();
        assert_eq!(fired.rule, "small");
        assert_eq!(fired.outcome, 4);

        let fired = first_match(BUCKETS, &40).unwrap();
        assert_eq!(fired.rule, "even");
        assert_eq!(fired.outcome, 20);

        assert_eq!(first_match(BUCKETS, &41).unwrap().rule, "any");
    }

    #[test]
    fn test_empty_table_matches_nothing() {
        let empty: &[Rule<u32, u32>] = &[];
        assert!(first_match(empty, &1).is_none());
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(rule_names(BUCKETS), vec!["small", "even", "any"]);
    }
}
