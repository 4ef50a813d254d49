//! `sb query` and `sb batch`.
//!
//! Both commands build one [`Engine`] from the configured catalog and alias
//! file. `batch` evaluates its queries concurrently on blocking tasks that
//! share the engine through an `Arc`; output stays in input order.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use storefront_brain_core::budget::format_price;
use storefront_brain_core::engine::{Engine, QueryInput, QueryOutcome};
use storefront_brain_core::lexicon::AliasMap;
use storefront_brain_core::models::{BudgetRange, ConversationContext, Intent, PlanTier};

use crate::catalog::{load_alias_file, load_catalog};
use crate::config::Config;

/// Load the catalog and aliases and build the engine.
pub fn build_engine(config: &Config) -> Result<Engine> {
    let catalog = load_catalog(&config.catalog.path)?;
    let aliases = match &config.aliases.path {
        Some(path) => load_alias_file(path)?,
        None => AliasMap::default(),
    };
    Ok(Engine::with_alias_map(
        catalog,
        &aliases,
        config.engine.settings(),
    ))
}

/// Options of a single `sb query` run.
#[derive(Debug, Default)]
pub struct QueryOptions {
    pub previous_intent: Option<Intent>,
    pub category: Option<String>,
    pub previous: Vec<String>,
    pub plan: Option<PlanTier>,
    pub json: bool,
}

pub fn run_query(config: &Config, text: &str, opts: QueryOptions) -> Result<()> {
    let engine = build_engine(config)?;
    let input = QueryInput {
        text: text.to_string(),
        context: ConversationContext {
            previous_intent: opts.previous_intent,
            active_category: opts.category,
            previous_recommended: opts.previous,
        },
        plan: opts.plan.unwrap_or_else(|| config.engine.plan_tier()),
    };
    let outcome = engine.run_query(&input);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchLine<'a> {
    query: &'a str,
    outcome: &'a QueryOutcome,
}

/// Non-empty lines that are not `#` comments.
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub async fn run_batch(config: &Config, path: &Path, json: bool) -> Result<()> {
    let queries = read_queries(path)?;
    let engine = Arc::new(build_engine(config)?);
    let plan = config.engine.plan_tier();

    let handles: Vec<_> = queries
        .iter()
        .map(|text| {
            let engine = Arc::clone(&engine);
            let input = QueryInput::new(text.clone()).with_plan(plan);
            tokio::task::spawn_blocking(move || engine.run_query(&input))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await.context("query task failed")?);
    }
    info!(queries = outcomes.len(), "batch complete");

    for (text, outcome) in queries.iter().zip(&outcomes) {
        if json {
            let line = BatchLine {
                query: text,
                outcome,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("> {}", text);
            print_outcome(outcome);
            println!();
        }
    }
    Ok(())
}

fn describe_budget(budget: &BudgetRange) -> String {
    let range = match (budget.min_price, budget.max_price) {
        (Some(min), Some(max)) => format!("{} - {}", format_price(min), format_price(max)),
        (Some(min), None) => format!("from {}", format_price(min)),
        (None, Some(max)) => format!("up to {}", format_price(max)),
        (None, None) => "none".to_string(),
    };
    if budget.is_ambiguous {
        format!("{} (ambiguous)", range)
    } else {
        range
    }
}

fn print_outcome(outcome: &QueryOutcome) {
    println!("{:<12} {}", "intent:", outcome.intent);
    println!("{:<12} {}", "budget:", describe_budget(&outcome.budget));
    for note in &outcome.budget.notes {
        println!("{:<12} {}", "", note);
    }
    match &outcome.category.effective {
        Some(slug) => println!("{:<12} {}", "category:", slug),
        None => println!("{:<12} -", "category:"),
    }
    if let Some(hint) = &outcome.category.missing_hint {
        println!("{:<12} {} (not in catalog)", "", hint);
    }
    if !outcome.alias.unknown_terms.is_empty() {
        println!(
            "{:<12} {} -> {}",
            "unknown:",
            outcome.alias.unknown_terms.join(", "),
            if outcome.alias.resolved_terms.is_empty() {
                "-".to_string()
            } else {
                outcome.alias.resolved_terms.join(", ")
            }
        );
    }
    if outcome.prices.price_range_no_match {
        let cat = match (outcome.prices.category_min, outcome.prices.category_max) {
            (Some(min), Some(max)) => format!("{} - {}", format_price(min), format_price(max)),
            _ => "-".to_string(),
        };
        println!("{:<12} no match (catalog range {})", "prices:", cat);
        if let (Some(price), Some(title)) = (
            outcome.prices.nearest_price_above_budget,
            &outcome.prices.nearest_title_above_budget,
        ) {
            println!("{:<12} nearest above budget: {} ({})", "", title, format_price(price));
        }
    }
    println!(
        "{:<12} {}{}",
        "escalation:",
        outcome.escalation.reason.as_str(),
        if outcome.escalation.needs_ai_help {
            " (needs AI help)"
        } else {
            ""
        }
    );
    println!("{:<12} {}", "scenario:", outcome.scenario.as_str());
    println!();

    if outcome.products.is_empty() {
        println!("No results.");
        return;
    }
    for (i, p) in outcome.products.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} ({})  id={}",
            i + 1,
            p.price,
            p.title,
            p.category,
            p.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_budget() {
        let mut b = BudgetRange {
            min_price: Some(600.0),
            max_price: Some(900.0),
            ..Default::default()
        };
        assert_eq!(describe_budget(&b), "600 - 900");
        b.min_price = None;
        b.is_ambiguous = true;
        assert_eq!(describe_budget(&b), "up to 900 (ambiguous)");
        assert_eq!(describe_budget(&BudgetRange::default()), "none");
    }

    #[test]
    fn test_read_queries_skips_comments() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("queries.txt");
        std::fs::write(&path, "# header\nsnowboard\n\n  unter 20 euro  \n").unwrap();
        assert_eq!(read_queries(&path).unwrap(), vec!["snowboard", "unter 20 euro"]);
    }
}
