//! Query entry point.
//!
//! An [`Engine`] owns one catalog snapshot together with everything derived
//! from it (attribute index, catalog profile) and the alias lexicon. It is
//! immutable after construction, so one engine can serve any number of
//! concurrent queries behind an `Arc`.
//!
//! ```
//! use storefront_brain_core::engine::{Engine, QueryInput};
//! use storefront_brain_core::lexicon::AliasMap;
//! use storefront_brain_core::models::Product;
//! use storefront_brain_core::settings::EngineSettings;
//!
//! let catalog = vec![Product {
//!     id: "b1".into(),
//!     title: "Freestyle Snowboard".into(),
//!     description: String::new(),
//!     category: "Snowboard".into(),
//!     tags: vec![],
//!     price: 390.0,
//! }];
//! let engine = Engine::new(catalog, Box::new(AliasMap::default()), EngineSettings::default());
//!
//! let outcome = engine.run_query(&QueryInput::new("ein snowboard bitte"));
//! assert_eq!(outcome.products.len(), 1);
//! assert_eq!(outcome.context.active_category.as_deref(), Some("snowboard"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::alias::{resolve_unknown_terms, AliasResolution};
use crate::attributes::{parse_query, AttributeIndex, ParsedQuery};
use crate::budget::{extract_budget, has_ceiling_wording};
use crate::catalog::CatalogProfile;
use crate::category::{detect_category, CategoryMatch};
use crate::escalation::{decide_escalation, detect_code_term, EscalationInput, EscalationSignal};
use crate::intent::{
    classify_intent, detect_explanation, wants_cheapest, wants_most_expensive, ExplainMode,
};
use crate::lexicon::{AliasMap, Lexicon};
use crate::models::{BudgetRange, ConversationContext, Intent, PlanTier, Product};
use crate::normalize::{is_numeric, normalize};
use crate::pipeline::{
    run_pipeline, PipelineQuery, PipelineState, PriceDiagnostics, Provenance, StageTrace,
};
use crate::scenario::{classify_scenario, Scenario, ScenarioInput};
use crate::senses::{detect_wax_sense, is_perfume_query};
use crate::settings::EngineSettings;

/// Compound parts shorter than this are not split off.
const MIN_COMPOUND_PART: usize = 4;

/// One customer utterance plus the conversation so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryInput {
    pub text: String,
    #[serde(default)]
    pub context: ConversationContext,
    #[serde(default)]
    pub plan: PlanTier,
}

impl QueryInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan = plan;
        self
    }
}

/// Everything understood about one query, and what to show.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub normalized: String,
    pub intent: Intent,
    pub budget: BudgetRange,
    pub prices: PriceDiagnostics,
    pub category: CategoryMatch,
    pub category_hint_without_match: bool,
    pub parsed: ParsedQuery,
    pub alias: AliasResolution,
    pub search_terms: Vec<String>,
    pub products: Vec<Product>,
    pub provenance: BTreeSet<Provenance>,
    pub escalation: EscalationSignal,
    pub scenario: Scenario,
    pub explain_mode: Option<ExplainMode>,
    /// Context to pass with the next turn.
    pub context: ConversationContext,
    pub trace: Vec<StageTrace>,
}

pub struct Engine {
    catalog: Vec<Product>,
    lexicon: Box<dyn Lexicon>,
    index: AttributeIndex,
    profile: CatalogProfile,
    settings: EngineSettings,
}

impl Engine {
    /// Build the per-catalog data. Rebuild the engine when the catalog
    /// changes.
    pub fn new(catalog: Vec<Product>, lexicon: Box<dyn Lexicon>, settings: EngineSettings) -> Self {
        let profile = CatalogProfile::build(&catalog);
        Self::from_parts(catalog, lexicon, profile, settings)
    }

    /// Like [`Engine::new`], dropping alias targets that do not occur in
    /// the catalog.
    pub fn with_alias_map(catalog: Vec<Product>, aliases: &AliasMap, settings: EngineSettings) -> Self {
        let profile = CatalogProfile::build(&catalog);
        let restricted = aliases.restricted_to(profile.tokens());
        debug!(
            loaded = aliases.len(),
            kept = restricted.len(),
            "aliases restricted to catalog tokens"
        );
        Self::from_parts(catalog, Box::new(restricted), profile, settings)
    }

    fn from_parts(
        catalog: Vec<Product>,
        lexicon: Box<dyn Lexicon>,
        profile: CatalogProfile,
        settings: EngineSettings,
    ) -> Self {
        let index = AttributeIndex::build(&catalog);
        info!(
            products = catalog.len(),
            categories = profile.categories().len(),
            aliases = lexicon.len(),
            "engine ready"
        );
        Self {
            catalog,
            lexicon,
            index,
            profile,
            settings,
        }
    }

    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    pub fn index(&self) -> &AttributeIndex {
        &self.index
    }

    pub fn profile(&self) -> &CatalogProfile {
        &self.profile
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn lexicon(&self) -> &dyn Lexicon {
        self.lexicon.as_ref()
    }

    /// Interpret one utterance. Pure and deterministic for a given engine.
    pub fn run_query(&self, input: &QueryInput) -> QueryOutcome {
        let text = input.text.as_str();
        let context = &input.context;
        let max_results = input.plan.max_results();
        let intent = classify_intent(text, context.previous_intent);
        let budget = extract_budget(text);

        if let Some(outcome) = self.explain_previous(input, intent, &budget) {
            return outcome;
        }

        let category = detect_category(
            text,
            &self.profile,
            context.active_category.as_deref(),
            budget.has_bounds(),
        );
        let parsed = parse_query(text);
        let alias = resolve_unknown_terms(text, self.profile.tokens(), self.lexicon.as_ref());
        let search_terms = self.search_terms(&parsed, &alias);
        let cheapest = wants_cheapest(text);
        let most_expensive = wants_most_expensive(text);

        let query = PipelineQuery {
            catalog: &self.catalog,
            index: &self.index,
            profile: &self.profile,
            settings: &self.settings,
            intent,
            budget: &budget,
            category: category.effective.as_deref(),
            parsed: &parsed,
            alias: &alias,
            search_terms: search_terms.clone(),
            wants_cheapest: cheapest,
            wants_most_expensive: most_expensive,
            perfume_query: is_perfume_query(text),
            wax_sense: detect_wax_sense(text),
            max_results,
        };
        let PipelineState {
            candidates,
            prices,
            category_hint_without_match,
            trace,
        } = run_pipeline(&query);
        // Own the selection so the per-query borrows end here.
        let flags = candidates.flags;
        let products: Vec<Product> = candidates.products.into_iter().cloned().collect();

        let has_category_match = category.effective.is_some() && !category_hint_without_match;
        let escalation = decide_escalation(&EscalationInput {
            budget: budget.clone(),
            bounds: self.profile.bounds_for(category.effective.as_deref()),
            unknown_terms: alias.unknown_terms.clone(),
            resolved_terms: alias.resolved_terms.clone(),
            strong_resolution: alias.has_strong_resolution(),
            has_category_match,
            price_range_no_match: prices.price_range_no_match,
            ceiling_wording: has_ceiling_wording(text),
            code_term: detect_code_term(text, self.profile.tokens()),
            settings: self.settings,
        });

        let scenario = classify_scenario(&ScenarioInput {
            intent,
            result_count: products.len(),
            has_budget: budget.has_bounds(),
            budget_ambiguous: budget.is_ambiguous,
            has_attribute_terms: !parsed.attribute_terms.is_empty(),
            explaining: false,
            price_range_no_match: prices.price_range_no_match,
            needs_ai_help: escalation.needs_ai_help,
            cheapest_single: flags.contains(&Provenance::CheapestSingle),
            most_expensive_single: flags.contains(&Provenance::MostExpensiveSingle),
        });

        info!(
            intent = %intent,
            results = products.len(),
            scenario = scenario.as_str(),
            escalation = escalation.reason.as_str(),
            "query evaluated"
        );

        QueryOutcome {
            normalized: normalize(text),
            intent,
            context: ConversationContext {
                previous_intent: Some(intent),
                active_category: category.effective.clone(),
                previous_recommended: products.iter().map(|p| p.id.clone()).collect(),
            },
            budget,
            prices,
            category,
            category_hint_without_match,
            parsed,
            alias,
            search_terms,
            products,
            provenance: flags,
            escalation,
            scenario,
            explain_mode: None,
            trace,
        }
    }

    /// A follow-up about the previous recommendation returns those products
    /// again without running the pipeline.
    fn explain_previous(
        &self,
        input: &QueryInput,
        intent: Intent,
        budget: &BudgetRange,
    ) -> Option<QueryOutcome> {
        let context = &input.context;
        if context.previous_recommended.is_empty() {
            return None;
        }
        let mode = detect_explanation(&input.text)?;
        let products: Vec<Product> = context
            .previous_recommended
            .iter()
            .filter_map(|id| self.catalog.iter().find(|p| &p.id == id))
            .take(input.plan.max_results())
            .cloned()
            .collect();
        if products.is_empty() {
            return None;
        }
        debug!(mode = mode.as_str(), items = products.len(), "explanation follow-up");

        Some(QueryOutcome {
            normalized: normalize(&input.text),
            intent,
            budget: budget.clone(),
            prices: PriceDiagnostics::default(),
            category: CategoryMatch {
                effective: context.active_category.clone(),
                ..Default::default()
            },
            category_hint_without_match: false,
            parsed: ParsedQuery::default(),
            alias: AliasResolution::default(),
            search_terms: Vec::new(),
            provenance: BTreeSet::new(),
            escalation: EscalationSignal::default(),
            scenario: classify_scenario(&ScenarioInput {
                intent,
                result_count: products.len(),
                explaining: true,
                ..Default::default()
            }),
            explain_mode: Some(mode),
            context: ConversationContext {
                previous_intent: Some(intent),
                active_category: context.active_category.clone(),
                previous_recommended: products.iter().map(|p| p.id.clone()).collect(),
            },
            products,
            trace: Vec::new(),
        })
    }

    /// Core terms, plus known catalog words that end a compound ("fressnapf"
    /// adds "napf"), plus resolved aliases. Deduplicated, in that order.
    fn search_terms(&self, parsed: &ParsedQuery, alias: &AliasResolution) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        let mut push = |t: &str| {
            if !terms.iter().any(|x| x == t) {
                terms.push(t.to_string());
            }
        };
        for term in &parsed.core_terms {
            push(term);
        }
        for term in &parsed.core_terms {
            if let Some(part) = self.compound_part(term) {
                push(part);
            }
        }
        for term in &alias.resolved_terms {
            push(term);
        }
        terms
    }

    /// Longest catalog token that `term` ends with.
    fn compound_part(&self, term: &str) -> Option<&str> {
        self.profile
            .tokens()
            .iter()
            .filter(|t| t.chars().count() >= MIN_COMPOUND_PART && !is_numeric(t))
            .filter(|t| t.as_str() != term && term.ends_with(t.as_str()))
            .max_by_key(|t| t.chars().count())
            .map(String::as_str)
    }
}
