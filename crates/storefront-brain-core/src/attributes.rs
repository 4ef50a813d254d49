//! Soft product attributes: skin type, audience, pet, room, product family.
//!
//! The same regex detectors run over two inputs:
//!
//! - every catalog product, once per catalog, producing the
//!   [`AttributeIndex`] (product id → [`AttributeFilter`] plus a shop-wide
//!   vocabulary used for reporting and learning, never for filtering);
//! - each query, through [`parse_query`], producing the filters the
//!   candidate pipeline applies.
//!
//! Pet values are compatible in both directions: a query for a generic
//! `pet` matches dog and cat products, and a query for `dog` matches
//! products marked for pets in general.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;

use crate::models::Product;
use crate::normalize::{contains_term, is_numeric, normalize, pad};
use crate::vocab::{
    is_noise_word, ATTRIBUTE_KEYWORDS, ATTRIBUTE_PHRASES, HUMAN_SKIN_CATEGORIES,
    PET_CATEGORY_WORDS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    SkinType,
    Audience,
    Pet,
    Room,
    Family,
}

impl AttributeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKey::SkinType => "skin_type",
            AttributeKey::Audience => "audience",
            AttributeKey::Pet => "pet",
            AttributeKey::Room => "room",
            AttributeKey::Family => "family",
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute key → matched values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeFilter(BTreeMap<AttributeKey, BTreeSet<String>>);

impl AttributeFilter {
    pub fn insert(&mut self, key: AttributeKey, value: &str) {
        self.0.entry(key).or_default().insert(value.to_string());
    }

    pub fn get(&self, key: AttributeKey) -> Option<&BTreeSet<String>> {
        self.0.get(&key)
    }

    pub fn contains(&self, key: AttributeKey, value: &str) -> bool {
        self.get(key).is_some_and(|v| v.contains(value))
    }

    pub fn has(&self, key: AttributeKey) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &BTreeSet<String>)> {
        self.0.iter()
    }

    /// Keys whose query values are satisfied by `product`.
    pub fn matched_keys(&self, product: &AttributeFilter) -> usize {
        self.iter()
            .filter(|(key, wanted)| key_matches(**key, wanted, product))
            .count()
    }

    /// Every key of this (query) filter is satisfied by `product`.
    pub fn is_satisfied_by(&self, product: &AttributeFilter) -> bool {
        self.iter()
            .filter(|(_, wanted)| !wanted.is_empty())
            .all(|(key, wanted)| key_matches(*key, wanted, product))
    }
}

fn key_matches(key: AttributeKey, wanted: &BTreeSet<String>, product: &AttributeFilter) -> bool {
    let Some(have) = product.get(key) else {
        return false;
    };
    if key == AttributeKey::Pet {
        return pets_compatible(wanted, have);
    }
    wanted.iter().any(|w| have.contains(w))
}

/// Generic `pet` matches any species, species match generic `pet`.
fn pets_compatible(wanted: &BTreeSet<String>, have: &BTreeSet<String>) -> bool {
    !have.is_empty()
        && wanted
            .iter()
            .any(|w| have.contains(w) || w == GENERIC_PET || have.contains(GENERIC_PET))
}

const GENERIC_PET: &str = "pet";

struct Detector {
    key: AttributeKey,
    value: &'static str,
    pattern: Regex,
}

fn detector(key: AttributeKey, value: &'static str, pattern: &str) -> Detector {
    Detector {
        key,
        value,
        pattern: Regex::new(pattern).unwrap(),
    }
}

static PRODUCT_DETECTORS: LazyLock<Vec<Detector>> = LazyLock::new(|| {
    use AttributeKey::*;
    vec![
        detector(SkinType, "dry", r"\b(trocken\w*|dry|xerose)\b"),
        detector(SkinType, "sensitive", r"\b(empfindlich\w*|sensibel\w*|sensible\w*|sensitive)\b"),
        detector(SkinType, "oily", r"\b(fettig\w*|ölig\w*|oily)\b"),
        detector(SkinType, "combination", r"\b(mischhaut|combination skin)\b"),
        detector(SkinType, "mature", r"\b(reife haut|mature|anti aging|anti age|anti falten)\b"),
        detector(Audience, "men", r"\b(herren|männer|mann|men|male)\b"),
        detector(Audience, "women", r"\b(damen|frauen|frau|women|woman|ladies|female)\b"),
        detector(Audience, "kids", r"\b(kinder|kind|kids|children|child|junior)\b"),
        detector(Audience, "baby", r"\b(baby|babys|säugling\w*|newborn)\b"),
        detector(Audience, "unisex", r"\bunisex\b"),
        detector(Pet, "dog", r"\b(hund|hunde|hunden|hundes|welpe\w*|dog|dogs|puppy)\b"),
        detector(Pet, "cat", r"\b(katze|katzen|kater|kitten|cat|cats)\b"),
        detector(Room, "bathroom", r"\b(bad|badezimmer|bathroom|dusche|shower)\b"),
        detector(Room, "kitchen", r"\b(küche|kueche|kitchen)\b"),
        detector(Room, "living_room", r"\b(wohnzimmer|living room|wohnung)\b"),
        detector(Room, "bedroom", r"\b(schlafzimmer|bedroom)\b"),
        detector(Family, "shower_gel", r"\b(duschgel\w*|shower gel|body wash)\b"),
        detector(Family, "shampoo", r"\b\w*shampoo\w*\b"),
        detector(Family, "hoodie", r"\b(hoodie\w*|kapuzenpullover\w*)\b"),
        detector(Family, "cleaner", r"\b(reiniger\w*|cleaner\w*|putzmittel\w*)\b"),
        detector(Family, "wipes", r"\b(\w*tücher|wipes)\b"),
        detector(Family, "spray", r"\b\w*spray\b"),
        detector(Family, "cream", r"\b(\w*creme|cream)\b"),
        detector(Family, "oil", r"\b(öl|\w+öl|oil)\b"),
        detector(Family, "soap", r"\b(\w*seife|soap)\b"),
        detector(Family, "bowl", r"\b(\w*napf|schüssel|bowl)\b"),
    ]
});

static GENERIC_PET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(haustier\w*|tierbedarf|tier|tiere|pet|pets|vierbeiner\w*|animal\w*)\b").unwrap()
});

/// Query-only synonyms for values the product detectors also produce.
static QUERY_EXTRA_DETECTORS: LazyLock<Vec<Detector>> = LazyLock::new(|| {
    use AttributeKey::*;
    vec![
        detector(Family, "cleaner", r"\b(schmutz\w*|fleck\w*|kalk\w*|stains?)\b"),
        detector(SkinType, "mature", r"\b(falten|wrinkles?)\b"),
    ]
});

fn run_detectors<'a>(
    detectors: impl IntoIterator<Item = &'a Detector>,
    normalized: &str,
    into: &mut AttributeFilter,
) {
    for d in detectors {
        if d.pattern.is_match(normalized) {
            into.insert(d.key, d.value);
        }
    }
}

fn detect(normalized: &str, with_query_extras: bool) -> AttributeFilter {
    let mut filter = AttributeFilter::default();
    run_detectors(PRODUCT_DETECTORS.iter(), normalized, &mut filter);
    if with_query_extras {
        run_detectors(QUERY_EXTRA_DETECTORS.iter(), normalized, &mut filter);
    }
    // Generic pet only when no species was named.
    if !filter.has(AttributeKey::Pet) && GENERIC_PET_RE.is_match(normalized) {
        filter.insert(AttributeKey::Pet, GENERIC_PET);
    }
    filter
}

/// Attributes of a single product (title, description, category, tags).
pub fn product_attributes(product: &Product) -> AttributeFilter {
    detect(&product.search_blob(), false)
}

/// Shop-wide statistics for one attribute key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocabularyEntry {
    pub key: AttributeKey,
    pub values: Vec<String>,
    pub example_titles: Vec<String>,
    pub usage_count: usize,
}

/// Per-catalog attribute index.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex {
    by_product: HashMap<String, AttributeFilter>,
    vocabulary: Vec<VocabularyEntry>,
}

const MAX_EXAMPLE_TITLES: usize = 3;

impl AttributeIndex {
    pub fn build(products: &[Product]) -> Self {
        let mut by_product = HashMap::with_capacity(products.len());
        let mut stats: BTreeMap<AttributeKey, (BTreeSet<String>, Vec<String>, usize)> =
            BTreeMap::new();

        for p in products {
            let attrs = product_attributes(p);
            for (key, values) in attrs.iter() {
                let (all, examples, count) = stats.entry(*key).or_default();
                all.extend(values.iter().cloned());
                if examples.len() < MAX_EXAMPLE_TITLES {
                    examples.push(p.title.clone());
                }
                *count += 1;
            }
            by_product.insert(p.id.clone(), attrs);
        }

        let mut vocabulary: Vec<VocabularyEntry> = stats
            .into_iter()
            .map(|(key, (values, example_titles, usage_count))| VocabularyEntry {
                key,
                values: values.into_iter().collect(),
                example_titles,
                usage_count,
            })
            .collect();
        vocabulary.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.key.cmp(&b.key)));

        Self {
            by_product,
            vocabulary,
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&AttributeFilter> {
        self.by_product.get(product_id)
    }

    /// Vocabulary sorted by usage, most used first.
    pub fn vocabulary(&self) -> &[VocabularyEntry] {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.by_product.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty()
    }
}

/// A query split into product words and describing words.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedQuery {
    pub core_terms: Vec<String>,
    pub attribute_terms: Vec<String>,
    pub attribute_filters: AttributeFilter,
}

/// Split a query into core and attribute terms and detect attribute filters.
///
/// Known multi-word phrases ("dry skin") are taken first and removed from
/// the text, so their words are not counted twice.
pub fn parse_query(text: &str) -> ParsedQuery {
    let normalized = normalize(text);
    let attribute_filters = detect(&normalized, true);

    let mut remaining = pad(&normalized);
    let mut attribute_terms: Vec<String> = Vec::new();
    let mut phrases: Vec<&str> = ATTRIBUTE_PHRASES.to_vec();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
    for phrase in phrases {
        if contains_term(&remaining, phrase) {
            attribute_terms.push(phrase.to_string());
            remaining = remaining.replace(&format!(" {} ", phrase), " ");
        }
    }

    let mut core_terms: Vec<String> = Vec::new();
    for token in remaining.split_whitespace() {
        if token.chars().count() < 3 || is_numeric(token) || is_noise_word(token) {
            continue;
        }
        let bucket = if ATTRIBUTE_KEYWORDS.contains(&token) {
            &mut attribute_terms
        } else {
            &mut core_terms
        };
        if !bucket.iter().any(|t| t == token) {
            bucket.push(token.to_string());
        }
    }

    ParsedQuery {
        core_terms,
        attribute_terms,
        attribute_filters,
    }
}

/// Product belongs to a category meant for human skin and not to a pet
/// category.
pub fn is_human_skin_product(product: &Product) -> bool {
    let category = product.category_slug();
    let padded = pad(&category);
    let skin = HUMAN_SKIN_CATEGORIES
        .iter()
        .any(|w| category.contains(w));
    let pet = PET_CATEGORY_WORDS
        .iter()
        .any(|w| contains_term(&padded, &format!("{}*", w)));
    skin && !pet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(id: &str, title: &str, category: &str, tags: &[&str]) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            price: 10.0,
        }
    }

    fn values(filter: &AttributeFilter, key: AttributeKey) -> Vec<String> {
        filter
            .get(key)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_product_attributes() {
        let p = make_product(
            "1",
            "Duschgel für Männer, trockene Haut",
            "Pflege",
            &["Bad"],
        );
        let attrs = product_attributes(&p);
        assert_eq!(values(&attrs, AttributeKey::SkinType), vec!["dry"]);
        assert_eq!(values(&attrs, AttributeKey::Audience), vec!["men"]);
        assert_eq!(values(&attrs, AttributeKey::Room), vec!["bathroom"]);
        assert_eq!(values(&attrs, AttributeKey::Family), vec!["shower_gel"]);
        assert!(!attrs.has(AttributeKey::Pet));
    }

    #[test]
    fn test_men_does_not_match_women() {
        let p = make_product("1", "Parfum for women", "Perfume", &[]);
        let attrs = product_attributes(&p);
        assert_eq!(values(&attrs, AttributeKey::Audience), vec!["women"]);
    }

    #[test]
    fn test_generic_pet_only_without_species() {
        let dog = product_attributes(&make_product("1", "Hundenapf für Haustiere", "Tierbedarf", &[]));
        assert_eq!(values(&dog, AttributeKey::Pet), vec!["pet"]);

        let dog = product_attributes(&make_product("2", "Napf für Hunde", "Tierbedarf", &[]));
        assert_eq!(values(&dog, AttributeKey::Pet), vec!["dog"]);
        assert_eq!(values(&dog, AttributeKey::Family), vec!["bowl"]);
    }

    #[test]
    fn test_pet_compatibility_is_symmetric() {
        let mut generic_query = AttributeFilter::default();
        generic_query.insert(AttributeKey::Pet, "pet");
        let mut dog_query = AttributeFilter::default();
        dog_query.insert(AttributeKey::Pet, "dog");

        let mut dog_product = AttributeFilter::default();
        dog_product.insert(AttributeKey::Pet, "dog");
        let mut pet_product = AttributeFilter::default();
        pet_product.insert(AttributeKey::Pet, "pet");
        let mut cat_product = AttributeFilter::default();
        cat_product.insert(AttributeKey::Pet, "cat");

        assert!(generic_query.is_satisfied_by(&dog_product));
        assert!(dog_query.is_satisfied_by(&pet_product));
        assert!(dog_query.is_satisfied_by(&dog_product));
        assert!(!dog_query.is_satisfied_by(&cat_product));
        assert!(!dog_query.is_satisfied_by(&AttributeFilter::default()));
    }

    #[test]
    fn test_parse_query_phrases_first() {
        let q = parse_query("Creme für trockene Haut");
        assert_eq!(q.attribute_terms, vec!["trockene haut"]);
        assert_eq!(q.core_terms, vec!["creme"]);
        assert_eq!(values(&q.attribute_filters, AttributeKey::SkinType), vec!["dry"]);
        assert_eq!(values(&q.attribute_filters, AttributeKey::Family), vec!["cream"]);
    }

    #[test]
    fn test_parse_query_english_and_keywords() {
        let q = parse_query("vegan lotion for dry skin");
        assert_eq!(q.attribute_terms, vec!["dry skin", "vegan"]);
        assert_eq!(q.core_terms, vec!["lotion"]);
        assert!(!q.attribute_filters.has(AttributeKey::Pet));
    }

    #[test]
    fn test_parse_query_extras() {
        let q = parse_query("etwas gegen Kalk im Bad");
        assert!(q.attribute_filters.contains(AttributeKey::Family, "cleaner"));
        assert!(q.attribute_filters.contains(AttributeKey::Room, "bathroom"));
        let q = parse_query("anti aging serum");
        assert!(q.attribute_filters.contains(AttributeKey::SkinType, "mature"));
    }

    #[test]
    fn test_parse_query_empty() {
        let q = parse_query("");
        assert!(q.core_terms.is_empty());
        assert!(q.attribute_terms.is_empty());
        assert!(q.attribute_filters.is_empty());
    }

    #[test]
    fn test_index_vocabulary_sorted_by_usage() {
        let products = vec![
            make_product("1", "Duschgel Herren", "Pflege", &[]),
            make_product("2", "Shampoo Damen", "Pflege", &[]),
            make_product("3", "Hundeshampoo", "Tierbedarf", &["Hund"]),
        ];
        let index = AttributeIndex::build(&products);
        assert_eq!(index.len(), 3);

        let top = &index.vocabulary()[0];
        assert_eq!(top.key, AttributeKey::Family);
        assert_eq!(top.usage_count, 3);
        assert_eq!(top.values, vec!["shampoo", "shower_gel"]);
        assert!(top.example_titles.len() <= 3);

        let pet = index.get("3").unwrap();
        assert!(pet.contains(AttributeKey::Pet, "dog"));
    }

    #[test]
    fn test_human_skin_product() {
        assert!(is_human_skin_product(&make_product("1", "Creme", "Hautpflege", &[])));
        assert!(is_human_skin_product(&make_product("2", "Lotion", "Beauty & Body", &[])));
        assert!(!is_human_skin_product(&make_product("3", "Pfotenbalsam", "Tierpflege", &[])));
        assert!(!is_human_skin_product(&make_product("4", "Dry food", "Pet Care", &[])));
        assert!(!is_human_skin_product(&make_product("5", "Kettle", "Household", &[])));
    }
}
