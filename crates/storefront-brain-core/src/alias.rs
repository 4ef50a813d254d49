//! Unknown-term resolution.
//!
//! Query words that do not occur anywhere in the catalog are "unknown". Each
//! call resolves them through exactly one source, tried in priority order:
//!
//! | Source | Used when | Match |
//! |--------|-----------|-------|
//! | alias | always tried first | exact [`Lexicon`] key, targets must be catalog tokens |
//! | fuzzy | no alias hit for *any* term | small edit distance, at most 3 per term |
//! | substring | neither of the above produced anything | containment, at most 3 per term |
//!
//! An alias hit outranks every guess: once one term resolves through the
//! lexicon, fuzzy and substring matching are skipped for the whole call.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::lexicon::Lexicon;
use crate::normalize::{is_numeric, normalize_key, tokenize};
use crate::vocab::is_noise_word;

/// Query words shorter than this are never looked up.
const MIN_TERM_LEN: usize = 3;
/// Cap on suggestions per term for fuzzy and substring matching.
const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Alias,
    Fuzzy,
    Substring,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AliasResolution {
    /// Content words of the query, in order.
    pub raw_terms: Vec<String>,
    /// Content words not found in the catalog.
    pub unknown_terms: Vec<String>,
    /// Catalog tokens the unknown words resolved to.
    pub resolved_terms: Vec<String>,
    pub alias_map_used: bool,
    pub source: Option<ResolutionSource>,
}

impl AliasResolution {
    /// True when the caller should hard-filter candidates to the resolved
    /// tokens.
    pub fn is_hard_filter(&self) -> bool {
        self.alias_map_used && !self.resolved_terms.is_empty()
    }

    /// At least one resolved token is long enough to be meaningful.
    pub fn has_strong_resolution(&self) -> bool {
        self.resolved_terms
            .iter()
            .any(|t| t.chars().count() >= MIN_TERM_LEN)
    }
}

/// Content words of `text`: at least three characters, not numeric, not a
/// stop/intent/budget word. Order preserved, duplicates removed.
pub fn content_terms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .filter(|t| !is_numeric(t) && !is_noise_word(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn edit_limit(term: &str) -> usize {
    match term.chars().count() {
        0..=3 => 0,
        4..=5 => 1,
        _ => 2,
    }
}

/// Catalog tokens within a small edit distance of `term`.
pub fn closest_catalog_tokens(term: &str, known: &BTreeSet<String>) -> Vec<String> {
    let limit = edit_limit(term);
    if limit == 0 {
        return Vec::new();
    }
    let len = term.chars().count();
    let mut scored: Vec<(usize, &String)> = known
        .iter()
        .filter(|k| k.chars().count() >= MIN_TERM_LEN && !is_numeric(k))
        .filter(|k| k.chars().count().abs_diff(len) <= 2)
        .filter_map(|k| {
            let d = strsim::levenshtein(term, k);
            (d <= limit).then_some((d, k))
        })
        .collect();
    scored.sort();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, k)| k.clone())
        .collect()
}

/// Catalog tokens that contain `term` or are contained in it.
pub fn substring_catalog_tokens(term: &str, known: &BTreeSet<String>) -> Vec<String> {
    let len = term.chars().count();
    let mut scored: Vec<(usize, &String)> = known
        .iter()
        .filter(|k| k.chars().count() >= 4 && !is_numeric(k))
        .filter(|k| term.contains(k.as_str()) || (len >= 4 && k.contains(term)))
        .map(|k| (k.chars().count().abs_diff(len), k))
        .collect();
    scored.sort();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, k)| k.clone())
        .collect()
}

fn push_unique(into: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

fn resolve_each<F>(unknown: &[String], f: F) -> Vec<String>
where
    F: Fn(&str) -> Vec<String>,
{
    let mut out = Vec::new();
    for term in unknown {
        push_unique(&mut out, f(term));
    }
    out
}

/// Resolve query words that the catalog does not know.
pub fn resolve_unknown_terms(
    text: &str,
    known: &BTreeSet<String>,
    lexicon: &dyn Lexicon,
) -> AliasResolution {
    let raw_terms = content_terms(text);
    let unknown_terms: Vec<String> = raw_terms
        .iter()
        .filter(|t| !known.contains(t.as_str()) && !known.contains(&normalize_key(t)))
        .cloned()
        .collect();

    if unknown_terms.is_empty() {
        return AliasResolution {
            raw_terms,
            ..Default::default()
        };
    }

    let from_alias = resolve_each(&unknown_terms, |term| {
        lexicon
            .targets(&normalize_key(term))
            .iter()
            .filter(|t| known.contains(t.as_str()))
            .cloned()
            .collect()
    });

    let (resolved_terms, source) = if !from_alias.is_empty() {
        (from_alias, Some(ResolutionSource::Alias))
    } else {
        let fuzzy = resolve_each(&unknown_terms, |term| closest_catalog_tokens(term, known));
        if !fuzzy.is_empty() {
            (fuzzy, Some(ResolutionSource::Fuzzy))
        } else {
            let sub = resolve_each(&unknown_terms, |term| substring_catalog_tokens(term, known));
            let source = (!sub.is_empty()).then_some(ResolutionSource::Substring);
            (sub, source)
        }
    };

    debug!(
        unknown = ?unknown_terms,
        resolved = ?resolved_terms,
        source = ?source,
        "unknown terms resolved"
    );

    AliasResolution {
        raw_terms,
        unknown_terms,
        resolved_terms,
        alias_map_used: source == Some(ResolutionSource::Alias),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::AliasMap;

    fn known(tokens: &[&str]) -> BTreeSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_content_terms_skip_noise() {
        assert_eq!(
            content_terms("Show me the cheapest Snowboard under 300 euros"),
            vec!["snowboard"]
        );
        assert_eq!(content_terms("xr500 xr500 tv"), vec!["xr500"]);
    }

    #[test]
    fn test_all_known_resolves_nothing() {
        let r = resolve_unknown_terms("snowboard bindung", &known(&["snowboard", "bindung"]), &AliasMap::default());
        assert!(r.unknown_terms.is_empty());
        assert!(r.resolved_terms.is_empty());
        assert_eq!(r.source, None);
    }

    #[test]
    fn test_alias_resolution_wins() {
        let catalog = known(&["napf", "hundenapf", "snowbord", "snowboard"]);
        let mut aliases = AliasMap::default();
        aliases.insert("fressnapf", ["napf", "phantom"]);

        // "snowbords" would resolve fuzzily, but the alias hit suppresses that.
        let r = resolve_unknown_terms("fressnapf snowbords", &catalog, &aliases);
        assert_eq!(r.unknown_terms, vec!["fressnapf", "snowbords"]);
        assert_eq!(r.resolved_terms, vec!["napf"]);
        assert!(r.alias_map_used);
        assert!(r.is_hard_filter());
        assert_eq!(r.source, Some(ResolutionSource::Alias));
    }

    #[test]
    fn test_fuzzy_when_no_alias() {
        let catalog = known(&["snowboard", "wasserkocher"]);
        let r = resolve_unknown_terms("snowbaord", &catalog, &AliasMap::default());
        assert_eq!(r.resolved_terms, vec!["snowboard"]);
        assert_eq!(r.source, Some(ResolutionSource::Fuzzy));
        assert!(!r.alias_map_used);
        assert!(!r.is_hard_filter());
    }

    #[test]
    fn test_substring_is_last_resort() {
        let catalog = known(&["napf", "futter"]);
        let r = resolve_unknown_terms("hundenapf", &catalog, &AliasMap::default());
        assert_eq!(r.resolved_terms, vec!["napf"]);
        assert_eq!(r.source, Some(ResolutionSource::Substring));
    }

    #[test]
    fn test_unresolvable_term_stays_unknown() {
        let catalog = known(&["snowboard", "jacke"]);
        let r = resolve_unknown_terms("xr500 unter 50 euro", &catalog, &AliasMap::default());
        assert_eq!(r.unknown_terms, vec!["xr500"]);
        assert!(r.resolved_terms.is_empty());
        assert!(!r.has_strong_resolution());
    }

    #[test]
    fn test_fuzzy_is_capped() {
        let catalog = known(&["jacket", "jackets", "jacketz", "jackett", "jackpot"]);
        let found = closest_catalog_tokens("jackex", &catalog);
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|t| t.starts_with("jacke")));
    }

    #[test]
    fn test_short_terms_are_not_fuzzed() {
        assert!(closest_catalog_tokens("tee", &known(&["tea", "tee", "toe"])).is_empty());
    }
}
