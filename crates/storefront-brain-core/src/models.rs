//! Core data models shared by every stage of the query pipeline.
//!
//! These types are produced once per query and discarded after the reply
//! is built. The catalog ([`Product`]) is owned by the caller and only ever
//! borrowed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::normalize::normalize;

/// A catalog product.
///
/// `tags` is always a canonical ordered list of strings. Catalog loaders are
/// responsible for collapsing any other representation before a product
/// reaches the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: f64,
}

impl Product {
    /// Normalized category slug (`"Snow Boards"` → `"snow boards"`).
    pub fn category_slug(&self) -> String {
        normalize(&self.category)
    }

    /// Normalized tag text, space-joined.
    pub fn tags_text(&self) -> String {
        normalize(&self.tags.join(" "))
    }

    /// Normalized concatenation of every searchable field.
    pub fn search_blob(&self) -> String {
        normalize(&format!(
            "{} {} {} {}",
            self.title,
            self.description,
            self.category,
            self.tags.join(" ")
        ))
    }
}

/// Coarse shopping goal of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Premium,
    Bargain,
    Gift,
    Bundle,
    Explore,
    #[default]
    QuickBuy,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Premium => "premium",
            Intent::Bargain => "bargain",
            Intent::Gift => "gift",
            Intent::Bundle => "bundle",
            Intent::Explore => "explore",
            Intent::QuickBuy => "quick_buy",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "premium" => Ok(Intent::Premium),
            "bargain" => Ok(Intent::Bargain),
            "gift" => Ok(Intent::Gift),
            "bundle" => Ok(Intent::Bundle),
            "explore" => Ok(Intent::Explore),
            "quick_buy" | "quickbuy" => Ok(Intent::QuickBuy),
            other => Err(format!(
                "unknown intent '{}': expected premium, bargain, gift, bundle, explore or quick_buy",
                other
            )),
        }
    }
}

/// Price range understood from an utterance.
///
/// Invariant: when both bounds are set, `min_price <= max_price`. A range may
/// carry bounds *and* `is_ambiguous` at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetRange {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub has_budget_word: bool,
    pub is_ambiguous: bool,
    pub notes: Vec<String>,
}

impl BudgetRange {
    pub fn has_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    /// Only a floor was given ("over 800").
    pub fn is_min_only(&self) -> bool {
        self.min_price.is_some() && self.max_price.is_none()
    }
}

/// Subscription tier bounding how many products a reply may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Starter,
    #[default]
    Pro,
    Enterprise,
}

impl PlanTier {
    pub fn max_results(&self) -> usize {
        match self {
            PlanTier::Starter => 2,
            PlanTier::Pro => 4,
            PlanTier::Enterprise => 6,
        }
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Ok(PlanTier::Starter),
            "pro" => Ok(PlanTier::Pro),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!(
                "unknown plan '{}': expected starter, pro or enterprise",
                other
            )),
        }
    }
}

/// State carried from the previous turn of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    pub previous_intent: Option<Intent>,
    #[serde(default)]
    pub active_category: Option<String>,
    /// Product ids recommended in the previous reply, in display order.
    #[serde(default)]
    pub previous_recommended: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parse_and_display() {
        assert_eq!("quick-buy".parse::<Intent>().unwrap(), Intent::QuickBuy);
        assert_eq!("Premium".parse::<Intent>().unwrap(), Intent::Premium);
        assert_eq!(Intent::Bargain.to_string(), "bargain");
        assert!("cheap".parse::<Intent>().is_err());
    }

    #[test]
    fn test_plan_tier_limits() {
        assert_eq!(PlanTier::Starter.max_results(), 2);
        assert_eq!(PlanTier::default().max_results(), 4);
        assert_eq!("enterprise".parse::<PlanTier>().unwrap().max_results(), 6);
    }

    #[test]
    fn test_search_blob_is_normalized() {
        let p = Product {
            id: "p1".into(),
            title: "Wasserkocher, 1.7L!".into(),
            description: "Edelstahl".into(),
            category: "Haushalt".into(),
            tags: vec!["Küche".into()],
            price: 29.9,
        };
        assert_eq!(p.search_blob(), "wasserkocher 1 7l edelstahl haushalt küche");
        assert_eq!(p.category_slug(), "haushalt");
    }
}
