//! Per-catalog derived data.
//!
//! [`CatalogProfile`] is computed once per catalog snapshot and reused by
//! every query: the set of known tokens (used to decide which query words
//! are unknown), product counts per category, and price bounds globally and
//! per category.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::Product;
use crate::normalize::{normalize_key, tokenize};

/// Lowest and highest price in a product set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    /// Bounds of `prices`, or `None` for an empty iterator.
    pub fn of<I: IntoIterator<Item = f64>>(prices: I) -> Option<Self> {
        prices.into_iter().fold(None, |acc, p| match acc {
            None => Some(PriceBounds { min: p, max: p }),
            Some(b) => Some(PriceBounds {
                min: b.min.min(p),
                max: b.max.max(p),
            }),
        })
    }
}

/// Category names shorter than this are ignored for category matching.
const MIN_CATEGORY_LEN: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CatalogProfile {
    tokens: BTreeSet<String>,
    categories: BTreeMap<String, usize>,
    category_bounds: BTreeMap<String, PriceBounds>,
    bounds: Option<PriceBounds>,
}

impl CatalogProfile {
    pub fn build(products: &[Product]) -> Self {
        let mut tokens = BTreeSet::new();
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for p in products {
            for field in [&p.title, &p.description, &p.category] {
                tokens.extend(tokenize(field));
            }
            for tag in &p.tags {
                tokens.extend(tokenize(tag));
            }
            let key = normalize_key(&p.category);
            if !key.is_empty() {
                tokens.insert(key);
            }

            let slug = p.category_slug();
            if slug.chars().count() >= MIN_CATEGORY_LEN {
                *categories.entry(slug.clone()).or_default() += 1;
                by_category.entry(slug).or_default().push(p.price);
            }
        }

        let category_bounds = by_category
            .into_iter()
            .filter_map(|(slug, prices)| PriceBounds::of(prices).map(|b| (slug, b)))
            .collect();

        Self {
            tokens,
            categories,
            category_bounds,
            bounds: PriceBounds::of(products.iter().map(|p| p.price)),
        }
    }

    /// Every normalized token that occurs anywhere in the catalog.
    pub fn tokens(&self) -> &BTreeSet<String> {
        &self.tokens
    }

    pub fn knows(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Category slug → product count.
    pub fn categories(&self) -> &BTreeMap<String, usize> {
        &self.categories
    }

    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.contains_key(slug)
    }

    pub fn product_count(&self, slug: &str) -> usize {
        self.categories.get(slug).copied().unwrap_or(0)
    }

    /// Price bounds of the category, or of the whole catalog when no category
    /// is given or the category has no products.
    pub fn bounds_for(&self, slug: Option<&str>) -> Option<PriceBounds> {
        slug.and_then(|s| self.category_bounds.get(s).copied())
            .or(self.bounds)
    }

    pub fn bounds(&self) -> Option<PriceBounds> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(id: &str, category: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            title: format!("{} item {}", category, id),
            description: String::new(),
            category: category.to_string(),
            tags: vec!["Sale Tag".to_string()],
            price,
        }
    }

    #[test]
    fn test_profile_counts_and_bounds() {
        let products = vec![
            make_product("1", "Snowboard", 300.0),
            make_product("2", "Snowboard", 650.0),
            make_product("3", "Pet Supplies", 12.5),
            make_product("4", "TV", 999.0),
        ];
        let profile = CatalogProfile::build(&products);

        assert_eq!(profile.product_count("snowboard"), 2);
        assert_eq!(profile.product_count("pet supplies"), 1);
        // Too short to be matched as a category.
        assert!(!profile.has_category("tv"));

        let b = profile.bounds_for(Some("snowboard")).unwrap();
        assert_eq!((b.min, b.max), (300.0, 650.0));
        let global = profile.bounds_for(Some("missing")).unwrap();
        assert_eq!((global.min, global.max), (12.5, 999.0));
    }

    #[test]
    fn test_profile_tokens() {
        let profile = CatalogProfile::build(&[make_product("1", "Pet Supplies", 3.0)]);
        assert!(profile.knows("pet"));
        assert!(profile.knows("supplies"));
        assert!(profile.knows("petsupplies"));
        assert!(profile.knows("sale"));
        assert!(!profile.knows("snowboard"));
    }

    #[test]
    fn test_empty_catalog() {
        let profile = CatalogProfile::build(&[]);
        assert!(profile.bounds().is_none());
        assert!(profile.categories().is_empty());
    }
}
