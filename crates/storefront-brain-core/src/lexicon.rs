//! Alias lexicon capability.
//!
//! The alias resolver depends on the [`Lexicon`] trait only. Where aliases
//! come from (a JSON file, a database, AI-suggested entries) is the caller's
//! business; the core reads them and never writes.
//!
//! [`AliasMap`] is the in-memory implementation: a normalized key mapped to
//! the catalog tokens it stands for.
//!
//! # Example
//!
//! ```
//! use storefront_brain_core::lexicon::{AliasMap, Lexicon};
//!
//! let mut map = AliasMap::default();
//! map.insert("Fress-Napf", ["Napf", "Hundenapf"]);
//!
//! assert_eq!(map.targets("fressnapf"), ["napf", "hundenapf"]);
//! assert!(map.targets("unknown").is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::normalize::normalize_key;

/// What kind of thing an alias names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasType {
    Brand,
    Category,
    Usage,
    #[default]
    Tag,
}

/// Where an alias entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasSource {
    #[default]
    Static,
    Ai,
    Manual,
}

/// A curated or learned alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub term: String,
    #[serde(default)]
    pub normalized_term: String,
    #[serde(default, rename = "type")]
    pub alias_type: AliasType,
    #[serde(default)]
    pub map_to_category_slug: Option<String>,
    #[serde(default)]
    pub map_to_tag: Option<String>,
    #[serde(default)]
    pub map_to_brand: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub source: AliasSource,
}

fn default_confidence() -> f32 {
    1.0
}

impl AliasEntry {
    /// The lookup key: `normalized_term` if present, otherwise derived from
    /// `term`.
    pub fn key(&self) -> String {
        if self.normalized_term.is_empty() {
            normalize_key(&self.term)
        } else {
            normalize_key(&self.normalized_term)
        }
    }

    /// Normalized tokens this entry resolves to (category, tag, brand).
    pub fn targets(&self) -> Vec<String> {
        [
            &self.map_to_category_slug,
            &self.map_to_tag,
            &self.map_to_brand,
        ]
        .into_iter()
        .flatten()
        .map(|t| normalize_key(t))
        .filter(|t| !t.is_empty())
        .collect()
    }
}

/// Read-only alias lookup.
///
/// Keys passed to [`Lexicon::targets`] are already [`normalize_key`]ed.
/// Implementations must be safe to share between concurrently running
/// queries.
pub trait Lexicon: Send + Sync {
    /// Catalog tokens the key stands for; empty when unknown.
    fn targets(&self, key: &str) -> &[String];

    /// Number of keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory alias map keyed by normalized term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl AliasMap {
    /// Add targets for a term. Keys and targets are normalized; duplicate
    /// targets are ignored and insertion order is kept.
    pub fn insert<I, S>(&mut self, term: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = normalize_key(term);
        if key.is_empty() {
            return;
        }
        let slot = self.entries.entry(key).or_default();
        for target in targets {
            let t = normalize_key(target.as_ref());
            if !t.is_empty() && !slot.contains(&t) {
                slot.push(t);
            }
        }
    }

    /// Build a map from alias entries, in order.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a AliasEntry>,
    {
        let mut map = AliasMap::default();
        for entry in entries {
            map.insert(&entry.key(), entry.targets());
        }
        map
    }

    /// Keep only targets that exist in `known`; drop keys left with none.
    pub fn restricted_to(&self, known: &BTreeSet<String>) -> AliasMap {
        let entries = self
            .entries
            .iter()
            .filter_map(|(key, targets)| {
                let kept: Vec<String> = targets
                    .iter()
                    .filter(|t| known.contains(t.as_str()))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| (key.clone(), kept))
            })
            .collect();
        AliasMap { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}

impl Lexicon for AliasMap {
    fn targets(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(term: &str, tag: Option<&str>, category: Option<&str>) -> AliasEntry {
        AliasEntry {
            term: term.to_string(),
            normalized_term: String::new(),
            alias_type: AliasType::Brand,
            map_to_category_slug: category.map(str::to_string),
            map_to_tag: tag.map(str::to_string),
            map_to_brand: None,
            confidence: 0.9,
            source: AliasSource::Ai,
        }
    }

    #[test]
    fn test_insert_normalizes_and_dedupes() {
        let mut map = AliasMap::default();
        map.insert("Fress Napf", ["Napf", "napf", " Hunde-Napf "]);
        map.insert("fressnapf", ["Napf"]);
        assert_eq!(map.targets("fressnapf"), ["napf", "hundenapf"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_from_entries_uses_all_targets() {
        let entries = vec![
            entry("Burton", Some("Snowboard"), Some("Wintersport")),
            entry("Nivea", Some("Creme"), None),
        ];
        let map = AliasMap::from_entries(&entries);
        assert_eq!(map.targets("burton"), ["wintersport", "snowboard"]);
        assert_eq!(map.targets("nivea"), ["creme"]);
    }

    #[test]
    fn test_restricted_to_drops_phantom_targets() {
        let mut map = AliasMap::default();
        map.insert("burton", ["snowboard", "jetpack"]);
        map.insert("acme", ["rocket"]);
        let known: BTreeSet<String> = ["snowboard".to_string()].into_iter().collect();

        let restricted = map.restricted_to(&known);
        assert_eq!(restricted.targets("burton"), ["snowboard"]);
        assert!(restricted.targets("acme").is_empty());
        assert_eq!(restricted.len(), 1);
    }

    #[test]
    fn test_entry_key_prefers_normalized_term() {
        let mut e = entry("Some Brand", None, None);
        assert_eq!(e.key(), "somebrand");
        e.normalized_term = "brand".into();
        assert_eq!(e.key(), "brand");
    }

    #[test]
    fn test_entry_deserializes_with_defaults() {
        let e: AliasEntry =
            serde_json::from_str(r#"{"term": "Burton", "map_to_tag": "snowboard"}"#).unwrap();
        assert_eq!(e.alias_type, AliasType::Tag);
        assert_eq!(e.source, AliasSource::Static);
        assert_eq!(e.confidence, 1.0);
        assert_eq!(e.targets(), vec!["snowboard"]);
    }
}
