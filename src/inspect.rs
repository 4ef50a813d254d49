//! Catalog and alias overview.
//!
//! `sb index` summarizes what the engine derives from the catalog: product
//! and token counts, categories with their price bounds, and the attribute
//! vocabulary. `sb aliases` shows which alias entries survive restriction to
//! catalog tokens, so a curator can spot entries that point at nothing.

use anyhow::Result;

use storefront_brain_core::budget::format_price;
use storefront_brain_core::catalog::CatalogProfile;
use storefront_brain_core::lexicon::{AliasMap, Lexicon};

use crate::catalog::{load_alias_file, load_catalog};
use crate::config::Config;
use crate::query::build_engine;

pub fn run_index(config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    let profile = engine.profile();

    println!("Storefront Brain: Catalog Index");
    println!("================================");
    println!();
    println!("  Catalog:     {}", config.catalog.path.display());
    println!("  Products:    {}", engine.catalog().len());
    println!("  Tokens:      {}", profile.tokens().len());
    println!("  Aliases:     {}", engine.lexicon().len());
    if let Some(b) = profile.bounds() {
        println!("  Prices:      {} - {}", format_price(b.min), format_price(b.max));
    }

    if !profile.categories().is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<24} {:>8} {:>10} {:>10}", "CATEGORY", "PRODUCTS", "MIN", "MAX");
        println!("  {}", "-".repeat(56));
        let mut categories: Vec<(&String, &usize)> = profile.categories().iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (slug, count) in categories {
            let (min, max) = match profile.bounds_for(Some(slug)) {
                Some(b) => (format_price(b.min), format_price(b.max)),
                None => ("-".to_string(), "-".to_string()),
            };
            println!("  {:<24} {:>8} {:>10} {:>10}", slug, count, min, max);
        }
    }

    let vocabulary = engine.index().vocabulary();
    println!();
    if vocabulary.is_empty() {
        println!("  No attributes detected.");
        return Ok(());
    }
    println!("  Attributes:");
    println!("  {:<12} {:>6}   {}", "KEY", "USED", "VALUES");
    println!("  {}", "-".repeat(56));
    for entry in vocabulary {
        println!(
            "  {:<12} {:>6}   {}",
            entry.key,
            entry.usage_count,
            entry.values.join(", ")
        );
        for title in &entry.example_titles {
            println!("  {:<12} {:>6}   e.g. {}", "", "", title);
        }
    }
    Ok(())
}

/// Alias keys whose targets were all dropped by restriction.
fn dropped_keys<'a>(loaded: &'a AliasMap, kept: &AliasMap) -> Vec<&'a str> {
    loaded
        .iter()
        .filter(|(key, _)| kept.targets(key).is_empty())
        .map(|(key, _)| key.as_str())
        .collect()
}

pub fn run_aliases(config: &Config) -> Result<()> {
    let Some(path) = &config.aliases.path else {
        println!("No alias file configured.");
        return Ok(());
    };
    let loaded = load_alias_file(path)?;
    let catalog = load_catalog(&config.catalog.path)?;
    let profile = CatalogProfile::build(&catalog);
    let kept = loaded.restricted_to(profile.tokens());

    if loaded.is_empty() {
        println!("No aliases.");
        return Ok(());
    }

    println!("{:<24} {:<8} TARGETS", "TERM", "STATUS");
    for (key, targets) in loaded.iter() {
        let kept_targets = kept.targets(key);
        let status = if kept_targets.is_empty() {
            "dropped"
        } else if kept_targets.len() < targets.len() {
            "partial"
        } else {
            "ok"
        };
        println!("{:<24} {:<8} {}", key, status, targets.join(", "));
    }

    let dropped = dropped_keys(&loaded, &kept);
    println!();
    println!(
        "{} loaded, {} kept, {} dropped",
        loaded.len(),
        kept.len(),
        dropped.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_dropped_keys() {
        let mut loaded = AliasMap::default();
        loaded.insert("burton", ["snowboard", "jetpack"]);
        loaded.insert("acme", ["rocket"]);
        let known: BTreeSet<String> = ["snowboard".to_string()].into_iter().collect();
        let kept = loaded.restricted_to(&known);

        assert_eq!(dropped_keys(&loaded, &kept), vec!["acme"]);
    }
}
