//! Catalog and alias file ingestion.
//!
//! This is the boundary where loosely-typed shop exports become the core's
//! canonical types. `tags` may arrive as a JSON array or as one
//! comma-separated string, ids as strings or numbers, prices as numbers or
//! strings; the core only ever sees `Vec<String>`, `String` and `f64`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use storefront_brain_core::budget::parse_price;
use storefront_brain_core::lexicon::{AliasEntry, AliasMap};
use storefront_brain_core::models::Product;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    List(Vec<String>),
    Text(String),
}

impl TagsField {
    fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsField::List(list) => list,
            TagsField::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdField {
    Text(String),
    Number(i64),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    id: IdField,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: Option<TagsField>,
    #[serde(default)]
    price: Option<PriceField>,
}

fn canonical(index: usize, raw: RawProduct) -> Result<Product> {
    let id = match raw.id {
        IdField::Text(s) => s.trim().to_string(),
        IdField::Number(n) => n.to_string(),
    };
    if id.is_empty() {
        bail!("product at index {} has an empty id", index);
    }
    let price = match raw.price {
        None => 0.0,
        Some(PriceField::Number(n)) => n,
        Some(PriceField::Text(s)) => match parse_price(&s) {
            Some(price) => price,
            None => bail!("product '{}' has an invalid price: {:?}", id, s),
        },
    };
    Ok(Product {
        id,
        title: raw.title,
        description: raw.description,
        category: raw.category,
        tags: raw.tags.map(TagsField::into_tags).unwrap_or_default(),
        price,
    })
}

/// Parse a catalog from JSON text (an array of products).
pub fn parse_catalog(json: &str) -> Result<Vec<Product>> {
    let raw: Vec<RawProduct> =
        serde_json::from_str(json).with_context(|| "Failed to parse catalog JSON")?;
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| canonical(i, r))
        .collect()
}

pub fn load_catalog(path: &Path) -> Result<Vec<Product>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let products =
        parse_catalog(&content).with_context(|| format!("Invalid catalog: {}", path.display()))?;
    if products.is_empty() {
        warn!(path = %path.display(), "catalog is empty");
    }
    info!(products = products.len(), path = %path.display(), "catalog loaded");
    Ok(products)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AliasFile {
    Map(BTreeMap<String, Vec<String>>),
    Entries(Vec<AliasEntry>),
}

/// Parse an alias file: either `{"term": ["target", ...]}` or an array of
/// alias entries.
pub fn parse_aliases(json: &str) -> Result<AliasMap> {
    let file: AliasFile =
        serde_json::from_str(json).with_context(|| "Failed to parse alias JSON")?;
    Ok(match file {
        AliasFile::Map(map) => {
            let mut aliases = AliasMap::default();
            for (term, targets) in &map {
                aliases.insert(term, targets);
            }
            aliases
        }
        AliasFile::Entries(entries) => AliasMap::from_entries(&entries),
    })
}

pub fn load_alias_file(path: &Path) -> Result<AliasMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read alias file: {}", path.display()))?;
    let aliases =
        parse_aliases(&content).with_context(|| format!("Invalid alias file: {}", path.display()))?;
    info!(aliases = aliases.iter().count(), path = %path.display(), "aliases loaded");
    Ok(aliases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_brain_core::lexicon::Lexicon;

    #[test]
    fn test_tags_array_or_string() {
        let products = parse_catalog(
            r#"[
                {"id": "a", "title": "A", "tags": ["Winter", " Sale "], "price": 10},
                {"id": "b", "title": "B", "tags": "Winter, ,Sale", "price": "12,50"},
                {"id": 7, "title": "C"}
            ]"#,
        )
        .unwrap();
        assert_eq!(products[0].tags, vec!["Winter", "Sale"]);
        assert_eq!(products[1].tags, vec!["Winter", "Sale"]);
        assert_eq!(products[1].price, 12.5);
        assert_eq!(products[2].id, "7");
        assert!(products[2].tags.is_empty());
        assert_eq!(products[2].price, 0.0);
        assert_eq!(products[2].category, "");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let err = parse_catalog(r#"[{"id": "a"}, {"id": "  "}]"#).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_german_thousands_price() {
        let products = parse_catalog(
            r#"[{"id": "tv", "price": "1.299,00"}, {"id": "lamp", "price": "24,90"}]"#,
        )
        .unwrap();
        assert_eq!(products[0].price, 1299.0);
        assert_eq!(products[1].price, 24.9);
    }

    #[test]
    fn test_invalid_price_is_rejected() {
        let err = parse_catalog(r#"[{"id": "a", "price": "cheap"}]"#).unwrap_err();
        assert!(err.to_string().contains("invalid price"));
    }

    #[test]
    fn test_alias_map_format() {
        let aliases = parse_aliases(r#"{"Fress-Napf": ["Napf"], "burton": ["snowboard"]}"#).unwrap();
        assert_eq!(aliases.targets("fressnapf"), ["napf"]);
        assert_eq!(aliases.len(), 2);
    }

    #[test]
    fn test_alias_entry_format() {
        let aliases = parse_aliases(
            r#"[{"term": "Burton", "type": "brand", "map_to_category_slug": "snowboard",
                 "confidence": 0.8, "source": "ai"}]"#,
        )
        .unwrap();
        assert_eq!(aliases.targets("burton"), ["snowboard"]);
    }
}
