//! Candidate pipeline.
//!
//! The pipeline narrows the catalog to a ranked, size-bounded list. It is a
//! fold: each stage takes the [`PipelineState`] by value and returns the next
//! one, in this order:
//!
//! | # | Stage | Never empties a non-empty set |
//! |---|-------|-------------------------------|
//! | 1 | category filter | yes |
//! | 2 | attribute filter (human-skin restriction, structured attributes) | yes |
//! | 3 | alias hard filter | yes |
//! | 4 | keyword scoring, wax sense exclusion | yes |
//! | 5 | perfume lock | yes |
//! | 6 | premium tier | yes |
//! | 7 | budget filter | **no**, records price diagnostics |
//! | 8 | fallback widening | only for a moderate price mismatch |
//! | 9 | sort | yes |
//! | 10 | terminal selection | yes |
//!
//! The result is empty only for an empty catalog or when stage 8 holds a
//! moderately unrealistic budget (the cheapest product in the category costs
//! at most `moderate_mismatch_ratio` times the ceiling).

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

use crate::alias::AliasResolution;
use crate::attributes::{is_human_skin_product, AttributeIndex, AttributeKey, ParsedQuery};
use crate::catalog::CatalogProfile;
use crate::models::{BudgetRange, Intent, Product};
use crate::normalize::{normalize, normalize_key, pad};
use crate::senses::{is_perfume_product, is_wrong_wax_sense, WaxSense};
use crate::settings::EngineSettings;

/// How the current candidate set came to be. Later stages consult these to
/// decide whether they may override earlier decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    CategoryFiltered,
    HumanSkinFiltered,
    AttributeFiltered,
    AliasFiltered,
    KeywordRanked,
    WaxSenseFiltered,
    PerfumeLocked,
    PremiumTier,
    BudgetFiltered,
    FallbackWidened,
    AboveBudgetFallback,
    MismatchHeld,
    CheapestSingle,
    MostExpensiveSingle,
}

/// The working product list plus its provenance.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet<'a> {
    pub products: Vec<&'a Product>,
    pub flags: BTreeSet<Provenance>,
}

impl<'a> CandidateSet<'a> {
    pub fn new(products: Vec<&'a Product>) -> Self {
        Self {
            products,
            flags: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn has(&self, flag: Provenance) -> bool {
        self.flags.contains(&flag)
    }

    /// Replace the products when `kept` is non-empty and record `flag`;
    /// otherwise leave the set alone. Returns whether it was applied.
    fn narrow(&mut self, kept: Vec<&'a Product>, flag: Provenance) -> bool {
        if kept.is_empty() {
            return false;
        }
        self.products = kept;
        self.flags.insert(flag);
        true
    }

    fn retain_nonempty<F>(&mut self, flag: Provenance, keep: F) -> bool
    where
        F: Fn(&Product) -> bool,
    {
        let kept = self.products.iter().copied().filter(|p| keep(*p)).collect();
        self.narrow(kept, flag)
    }
}

/// Price facts for honest messaging when the budget does not fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceDiagnostics {
    pub price_range_no_match: bool,
    pub user_min: Option<f64>,
    pub user_max: Option<f64>,
    pub category_min: Option<f64>,
    pub category_max: Option<f64>,
    pub nearest_price_above_budget: Option<f64>,
    pub nearest_title_above_budget: Option<String>,
}

/// One line of the stage log carried in the outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTrace {
    pub stage: &'static str,
    pub before: usize,
    pub after: usize,
}

/// Everything the stages know about the query and the catalog.
pub struct PipelineQuery<'a> {
    pub catalog: &'a [Product],
    pub index: &'a AttributeIndex,
    pub profile: &'a CatalogProfile,
    pub settings: &'a EngineSettings,
    pub intent: Intent,
    pub budget: &'a BudgetRange,
    pub category: Option<&'a str>,
    pub parsed: &'a ParsedQuery,
    pub alias: &'a AliasResolution,
    /// Core words to score on: core terms, compound parts and resolved
    /// aliases.
    pub search_terms: Vec<String>,
    pub wants_cheapest: bool,
    pub wants_most_expensive: bool,
    pub perfume_query: bool,
    pub wax_sense: Option<WaxSense>,
    pub max_results: usize,
}

impl PipelineQuery<'_> {
    /// The category prices are compared against: none when the category
    /// stage found no product in it.
    fn price_scope(&self, state: &PipelineState<'_>) -> Option<&str> {
        self.category.filter(|_| !state.category_hint_without_match)
    }

    fn in_category(&self, product: &Product) -> bool {
        self.category
            .map_or(true, |slug| product.category_slug() == slug)
    }

    fn within_budget(&self, product: &Product) -> bool {
        self.budget.min_price.map_or(true, |min| product.price >= min)
            && self.budget.max_price.map_or(true, |max| product.price <= max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineState<'a> {
    pub candidates: CandidateSet<'a>,
    pub prices: PriceDiagnostics,
    /// A category was detected but none of the candidates belong to it.
    pub category_hint_without_match: bool,
    pub trace: Vec<StageTrace>,
}

type Stage = for<'a> fn(PipelineState<'a>, &PipelineQuery<'a>) -> PipelineState<'a>;

pub static STAGES: &[(&str, Stage)] = &[
    ("category", category_stage),
    ("attributes", attribute_stage),
    ("alias", alias_stage),
    ("keywords", keyword_stage),
    ("perfume", perfume_stage),
    ("premium", premium_stage),
    ("budget", budget_stage),
    ("fallback", fallback_stage),
    ("sort", sort_stage),
    ("terminal", terminal_stage),
];

/// Run every stage over the full catalog.
pub fn run_pipeline<'a>(query: &PipelineQuery<'a>) -> PipelineState<'a> {
    let start = PipelineState {
        candidates: CandidateSet::new(query.catalog.iter().collect()),
        ..Default::default()
    };
    STAGES.iter().fold(start, |state, &(name, stage)| {
        let before = state.candidates.len();
        let mut next = stage(state, query);
        let after = next.candidates.len();
        debug!(stage = name, before, after, "pipeline stage");
        next.trace.push(StageTrace {
            stage: name,
            before,
            after,
        });
        next
    })
}

fn category_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    if q.category.is_none() {
        return state;
    }
    if !state
        .candidates
        .retain_nonempty(Provenance::CategoryFiltered, |p| q.in_category(p))
    {
        debug!(category = ?q.category, "category hint without matching products");
        state.category_hint_without_match = true;
    }
    state
}

fn attribute_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    let filters = &q.parsed.attribute_filters;
    if filters.is_empty() {
        return state;
    }
    if filters.has(AttributeKey::SkinType) && !filters.has(AttributeKey::Pet) {
        state
            .candidates
            .retain_nonempty(Provenance::HumanSkinFiltered, is_human_skin_product);
    }
    let applied = state
        .candidates
        .retain_nonempty(Provenance::AttributeFiltered, |p| {
            q.index
                .get(&p.id)
                .is_some_and(|attrs| filters.is_satisfied_by(attrs))
        });
    if !applied {
        debug!("attribute filter discarded: would empty set");
    }
    state
}

fn alias_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    if !q.alias.is_hard_filter() {
        return state;
    }
    let resolved = &q.alias.resolved_terms;
    let applied = state.candidates.retain_nonempty(Provenance::AliasFiltered, |p| {
        let blob = p.search_blob();
        let key = normalize_key(&blob);
        let blob = pad(&blob);
        resolved
            .iter()
            .any(|t| blob.contains(&format!(" {}", t)) || key.contains(t.as_str()))
    });
    if !applied {
        debug!(resolved = ?resolved, "alias filter matched nothing, kept prior set");
    }
    state
}

/// Minimum word length for the prefix bonus.
const PREFIX_BONUS_LEN: usize = 4;

struct Scored<'a> {
    product: &'a Product,
    attribute_matches: usize,
    total: u32,
}

/// Normalized product fields, computed once per scored product.
struct ProductText {
    title: String,
    tags: String,
    category: String,
    description: String,
    blob: String,
}

impl ProductText {
    fn of(product: &Product) -> Self {
        Self {
            title: normalize(&product.title),
            tags: product.tags_text(),
            category: product.category_slug(),
            description: normalize(&product.description),
            blob: pad(&product.search_blob()),
        }
    }

    /// Title 5, tag 4, category 3, description 2, word-prefix bonus 1.
    fn word_score(&self, word: &str) -> u32 {
        if self.title.contains(word) {
            5
        } else if self.tags.contains(word) {
            4
        } else if self.category.contains(word) {
            3
        } else if self.description.contains(word) {
            2
        } else if word.chars().count() >= PREFIX_BONUS_LEN {
            let stem: String = word.chars().take(PREFIX_BONUS_LEN).collect();
            u32::from(self.blob.contains(&format!(" {}", stem)))
        } else {
            0
        }
    }
}

fn score_product<'a>(product: &'a Product, q: &PipelineQuery<'_>) -> Scored<'a> {
    let text = ProductText::of(product);
    let core: u32 = q.search_terms.iter().map(|w| text.word_score(w)).sum();
    let attribute_words: u32 = q
        .parsed
        .attribute_terms
        .iter()
        .flat_map(|t| t.split(' '))
        .filter(|w| w.chars().count() >= 3)
        .map(|w| u32::from(text.word_score(w) > 0))
        .sum();
    let attribute_matches = q
        .index
        .get(&product.id)
        .map_or(0, |attrs| q.parsed.attribute_filters.matched_keys(attrs));

    // Products must match a core word when there are any.
    let total = if !q.search_terms.is_empty() && core == 0 {
        0
    } else {
        core + attribute_words * 2 + attribute_matches as u32 * 3
    };
    Scored {
        product,
        attribute_matches,
        total,
    }
}

/// Price order used to break score ties.
fn intent_price_order(intent: Intent, a: &Product, b: &Product) -> Ordering {
    match intent {
        Intent::Premium => cmp_price(b, a),
        Intent::Bargain | Intent::Gift | Intent::QuickBuy => cmp_price(a, b),
        Intent::Explore | Intent::Bundle => Ordering::Equal,
    }
}

fn cmp_price(a: &Product, b: &Product) -> Ordering {
    a.price.total_cmp(&b.price)
}

fn keyword_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    let has_words = !q.search_terms.is_empty() || !q.parsed.attribute_terms.is_empty();
    if has_words {
        let mut scored: Vec<Scored<'a>> = state
            .candidates
            .products
            .iter()
            .map(|p| score_product(p, q))
            .filter(|s| s.total > 0)
            .collect();
        scored.sort_by(|a, b| {
            b.attribute_matches
                .cmp(&a.attribute_matches)
                .then(b.total.cmp(&a.total))
                .then_with(|| intent_price_order(q.intent, a.product, b.product))
                .then_with(|| a.product.id.cmp(&b.product.id))
        });
        scored.truncate(q.settings.keyword_top_k);
        let kept = scored.into_iter().map(|s| s.product).collect();
        if !state.candidates.narrow(kept, Provenance::KeywordRanked) {
            debug!(terms = ?q.search_terms, "no candidate scored, kept prior set");
        }
    }

    if let Some(sense) = q.wax_sense {
        state
            .candidates
            .retain_nonempty(Provenance::WaxSenseFiltered, |p| !is_wrong_wax_sense(p, sense));
    }
    state
}

fn perfume_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    if q.perfume_query {
        state
            .candidates
            .retain_nonempty(Provenance::PerfumeLocked, is_perfume_product);
    }
    state
}

/// Price at the given percentile (nearest rank, rounded down).
fn percentile(prices: &mut [f64], pct: f64) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(f64::total_cmp);
    let idx = ((prices.len() - 1) as f64 * pct).floor() as usize;
    prices.get(idx).copied()
}

fn premium_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    let applies = q.intent == Intent::Premium
        && !q.budget.has_bounds()
        && !q.wants_most_expensive
        && state.candidates.len() >= q.settings.premium_min_candidates;
    if !applies {
        return state;
    }
    let mut prices: Vec<f64> = state.candidates.products.iter().map(|p| p.price).collect();
    if let Some(threshold) = percentile(&mut prices, q.settings.premium_percentile) {
        debug!(threshold, "premium tier cut");
        state
            .candidates
            .retain_nonempty(Provenance::PremiumTier, |p| p.price >= threshold);
    }
    state
}

fn budget_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    if !q.budget.has_bounds() {
        return state;
    }
    let scope = q.price_scope(&state);
    let bounds = q.profile.bounds_for(scope);
    let mut prices = PriceDiagnostics {
        user_min: q.budget.min_price,
        user_max: q.budget.max_price,
        category_min: bounds.map(|b| b.min),
        category_max: bounds.map(|b| b.max),
        ..Default::default()
    };

    let before = std::mem::take(&mut state.candidates.products);
    let (kept, dropped): (Vec<&Product>, Vec<&Product>) =
        before.iter().copied().partition(|p| q.within_budget(p));

    if kept.is_empty() && !before.is_empty() {
        prices.price_range_no_match = true;
        if let Some(max) = q.budget.max_price {
            if let Some(nearest) = dropped
                .iter()
                .filter(|p| p.price > max)
                .min_by(|a, b| cmp_price(a, b))
            {
                prices.nearest_price_above_budget = Some(nearest.price);
                prices.nearest_title_above_budget = Some(nearest.title.clone());
            }
        }
    }
    if let Some(b) = bounds {
        let too_low = q.budget.max_price.is_some_and(|max| max < b.min);
        let too_high = q.budget.min_price.is_some_and(|min| min > b.max);
        if too_low || too_high {
            prices.price_range_no_match = true;
        }
    }
    if scope.is_none()
        && q
            .budget
            .max_price
            .is_some_and(|max| max < q.settings.very_low_global_budget)
    {
        prices.price_range_no_match = true;
    }

    if !kept.is_empty() {
        state.candidates.flags.insert(Provenance::BudgetFiltered);
    }
    debug!(
        kept = kept.len(),
        no_match = prices.price_range_no_match,
        "budget filter"
    );
    state.candidates.products = kept;
    state.prices = prices;
    state
}

/// The cheapest product in the category is above the ceiling, but not by
/// much. Widening would only show products the customer cannot afford.
fn is_moderate_mismatch(state: &PipelineState<'_>, q: &PipelineQuery<'_>) -> bool {
    let (Some(_), Some(max), Some(cat_min)) =
        (q.price_scope(state), q.budget.max_price, state.prices.category_min)
    else {
        return false;
    };
    state.prices.price_range_no_match
        && cat_min > max
        && cat_min <= max * q.settings.moderate_mismatch_ratio
}

fn fallback_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    if !state.candidates.is_empty() || q.catalog.is_empty() {
        return state;
    }
    if is_moderate_mismatch(&state, q) {
        debug!("moderate price mismatch, fallback skipped");
        state.candidates.flags.insert(Provenance::MismatchHeld);
        return state;
    }

    let locked = state.candidates.has(Provenance::PerfumeLocked);
    let base: Vec<&Product> = if locked {
        q.catalog.iter().filter(|p| is_perfume_product(p)).collect()
    } else {
        q.catalog.iter().collect()
    };
    let scoped: Vec<&Product> = base.iter().copied().filter(|p| q.in_category(p)).collect();
    let scope = if scoped.is_empty() { base } else { scoped };

    let budgeted: Vec<&Product> = scope.iter().copied().filter(|p| q.within_budget(p)).collect();
    if !budgeted.is_empty() {
        state.candidates.products = budgeted;
        state.candidates.flags.insert(Provenance::FallbackWidened);
        return state;
    }

    if let Some(max) = q.budget.max_price {
        let mut above: Vec<&Product> = scope.iter().copied().filter(|p| p.price > max).collect();
        above.sort_by(|a, b| cmp_price(a, b).then_with(|| a.id.cmp(&b.id)));
        above.truncate(q.settings.above_budget_fallback);
        if !above.is_empty() {
            state.candidates.products = above;
            state.candidates.flags.insert(Provenance::AboveBudgetFallback);
            return state;
        }
    }

    state.candidates.products = if scope.is_empty() {
        q.catalog.iter().collect()
    } else {
        scope
    };
    state.candidates.flags.insert(Provenance::FallbackWidened);
    state
}

fn sort_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    let products = &mut state.candidates.products;
    let by_id = |a: &&Product, b: &&Product| a.id.cmp(&b.id);
    if state.candidates.flags.contains(&Provenance::AboveBudgetFallback) || q.budget.is_min_only() {
        products.sort_by(|a, b| cmp_price(a, b).then_with(|| by_id(a, b)));
    } else if q.budget.max_price.is_some() {
        products.sort_by(|a, b| cmp_price(b, a).then_with(|| by_id(a, b)));
    } else {
        match q.intent {
            Intent::Premium => products.sort_by(|a, b| cmp_price(b, a).then_with(|| by_id(a, b))),
            Intent::Bargain | Intent::Gift | Intent::QuickBuy => {
                products.sort_by(|a, b| cmp_price(a, b).then_with(|| by_id(a, b)))
            }
            Intent::Explore => products.sort_by(|a, b| {
                normalize(&a.title)
                    .cmp(&normalize(&b.title))
                    .then_with(|| by_id(a, b))
            }),
            Intent::Bundle => {}
        }
    }
    state
}

fn terminal_stage<'a>(mut state: PipelineState<'a>, q: &PipelineQuery<'a>) -> PipelineState<'a> {
    let candidates = &mut state.candidates;
    if q.wants_cheapest && !candidates.is_empty() {
        candidates
            .products
            .sort_by(|a, b| cmp_price(a, b).then_with(|| a.id.cmp(&b.id)));
        candidates.products.truncate(1);
        candidates.flags.insert(Provenance::CheapestSingle);
    } else if q.intent == Intent::Premium
        && q.wants_most_expensive
        && !q.budget.has_bounds()
        && !candidates.is_empty()
    {
        candidates
            .products
            .sort_by(|a, b| cmp_price(b, a).then_with(|| a.id.cmp(&b.id)));
        candidates.products.truncate(1);
        candidates.flags.insert(Provenance::MostExpensiveSingle);
    } else {
        candidates.products.truncate(q.max_results);
    }
    state
}
