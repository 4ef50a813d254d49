//! Category detection.
//!
//! Sources are tried in this order; the first that yields a catalog category
//! decides:
//!
//! 1. **Overrides**: unambiguous product nouns ("kettle", "smartphone",
//!    "jeans") name their category outright.
//! 2. **Explicit**: "kategorie X" / "category X".
//! 3. **Text and hints**: catalog category names matched on word boundaries,
//!    plus keyword hints from [`CATEGORY_KEYWORDS`]. Hints match word
//!    prefixes and are filtered through per-category negative words, so
//!    "modern" never suggests "mode". When several categories match, the one
//!    with the most products wins.
//! 4. **Context**: the category active in the previous turn, kept even when
//!    the catalog no longer carries it.
//!
//! A hint that points to a category the catalog does not carry is reported
//! as `missing_hint` so the reply can say so.

use serde::Serialize;
use std::cmp::Reverse;

use crate::catalog::CatalogProfile;
use crate::normalize::{contains_any, contains_term, normalize, pad};
use crate::vocab::{
    CATEGORY_KEYWORDS, CATEGORY_NEGATIVE_WORDS, CATEGORY_OVERRIDES, CATEGORY_SYNONYMS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Override,
    Explicit,
    Text,
    Context,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryMatch {
    /// Catalog category slug the pipeline filters on.
    pub effective: Option<String>,
    /// Every catalog category the text pointed to.
    pub matched: Vec<String>,
    /// Hint key recognized in the text that the catalog does not carry.
    pub missing_hint: Option<String>,
    pub source: Option<CategorySource>,
}

impl CategoryMatch {
    /// A category was found in the current utterance (not carried over).
    pub fn from_text(&self) -> bool {
        self.effective.is_some() && self.source != Some(CategorySource::Context)
    }
}

const PLURAL_SUFFIXES: &[&str] = &["s", "e", "n", "en"];

fn mentions(padded: &str, slug: &str) -> bool {
    contains_term(padded, slug)
        || PLURAL_SUFFIXES
            .iter()
            .any(|s| contains_term(padded, &format!("{}{}", slug, s)))
}

fn negatives(key: &str) -> &'static [&'static str] {
    CATEGORY_NEGATIVE_WORDS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

fn synonyms(key: &str) -> &'static [&'static str] {
    CATEGORY_SYNONYMS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

/// Does a hint word occur in the query, ignoring the key's negative words?
fn hint_matches(key: &str, words: &[&str], tokens: &[&str], padded: &str) -> bool {
    let negative = negatives(key);
    words.iter().any(|w| {
        if w.contains(' ') {
            contains_term(padded, w)
        } else {
            tokens
                .iter()
                .any(|t| t.starts_with(w) && !negative.contains(t))
        }
    })
}

/// Catalog category a hint key stands for: an exact synonym first, then any
/// category whose name contains a synonym as a word (most products wins).
pub fn resolve_hint(key: &str, profile: &CatalogProfile) -> Option<String> {
    let syns = synonyms(key);
    if let Some(exact) = syns.iter().find(|s| profile.has_category(s)) {
        return Some(exact.to_string());
    }
    profile
        .categories()
        .iter()
        .filter(|(slug, _)| {
            let padded = pad(slug);
            syns.iter().any(|s| contains_term(&padded, s))
        })
        .max_by_key(|(slug, count)| (**count, Reverse((*slug).clone())))
        .map(|(slug, _)| slug.clone())
}

fn explicit_category(padded: &str, profile: &CatalogProfile) -> Option<String> {
    profile
        .categories()
        .keys()
        .find(|slug| {
            contains_term(padded, &format!("kategorie {}", slug))
                || contains_term(padded, &format!("category {}", slug))
        })
        .cloned()
}

/// Pick among several matched categories: most products, then a name that
/// literally appears in the text, then alphabetical.
fn select(matched: &[String], profile: &CatalogProfile, padded: &str) -> Option<String> {
    matched
        .iter()
        .max_by_key(|slug| {
            (
                profile.product_count(slug),
                mentions(padded, slug),
                Reverse((*slug).clone()),
            )
        })
        .cloned()
}

/// Detect the category a query is about.
pub fn detect_category(
    text: &str,
    profile: &CatalogProfile,
    context_category: Option<&str>,
    has_budget: bool,
) -> CategoryMatch {
    let normalized = normalize(text);
    let padded = pad(&normalized);
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let mut missing_hint: Option<String> = None;

    for (nouns, key) in CATEGORY_OVERRIDES {
        if !contains_any(&padded, nouns) {
            continue;
        }
        match resolve_hint(key, profile) {
            Some(slug) => {
                return CategoryMatch {
                    effective: Some(slug.clone()),
                    matched: vec![slug],
                    missing_hint: None,
                    source: Some(CategorySource::Override),
                }
            }
            None => {
                missing_hint.get_or_insert_with(|| key.to_string());
            }
        }
    }

    if let Some(slug) = explicit_category(&padded, profile) {
        return CategoryMatch {
            effective: Some(slug.clone()),
            matched: vec![slug],
            missing_hint,
            source: Some(CategorySource::Explicit),
        };
    }

    let mut matched: Vec<String> = profile
        .categories()
        .keys()
        .filter(|slug| mentions(&padded, slug))
        .cloned()
        .collect();

    for (key, words) in CATEGORY_KEYWORDS {
        if !hint_matches(key, words, &tokens, &padded) {
            continue;
        }
        match resolve_hint(key, profile) {
            Some(slug) if !matched.contains(&slug) => matched.push(slug),
            Some(_) => {}
            None => {
                missing_hint.get_or_insert_with(|| key.to_string());
            }
        }
    }

    // "board" with a budget almost always means a snowboard.
    if matched.is_empty() && has_budget && tokens.contains(&"board") {
        if let Some(slug) = resolve_hint("snowboard", profile) {
            matched.push(slug);
        }
    }

    if let Some(effective) = select(&matched, profile, &padded) {
        return CategoryMatch {
            effective: Some(effective),
            matched,
            missing_hint: None,
            source: Some(CategorySource::Text),
        };
    }

    // Carried over as given; the pipeline reports it when nothing matches.
    let carried = context_category.map(normalize).filter(|slug| !slug.is_empty());
    CategoryMatch {
        source: carried.as_ref().map(|_| CategorySource::Context),
        effective: carried,
        matched,
        missing_hint,
    }
}
