//! # Storefront Brain Core
//!
//! Query understanding and candidate selection for a conversational
//! storefront assistant: given a customer utterance, the conversation so
//! far and a product catalog, decide what the customer wants, narrow the
//! catalog to a ranked list, and decide whether an AI fallback is needed.
//!
//! This crate contains no filesystem I/O, no async runtime and no global
//! state. Every operation is total: ambiguity, unknown words and empty
//! results are reported as data, never as errors.
//!
//! | Module | Role |
//! |--------|------|
//! | [`models`] | products, budget, intent, plan tier, conversation context |
//! | [`settings`] | named engine thresholds |
//! | [`normalize`] | case folding, tokenization, table matching |
//! | [`vocab`] | German and English keyword tables |
//! | [`rules`] | first-match-wins rule tables |
//! | [`intent`] | shopping intent, cheapest/most-expensive, follow-ups |
//! | [`budget`] | price range extraction |
//! | [`lexicon`] | alias lookup capability |
//! | [`alias`] | unknown-term resolution |
//! | [`catalog`] | per-catalog tokens, category counts, price bounds |
//! | [`category`] | category detection |
//! | [`attributes`] | soft attributes and the attribute index |
//! | [`senses`] | wax and perfume disambiguation |
//! | [`pipeline`] | candidate filtering, fallback, sorting |
//! | [`escalation`] | AI escalation decision |
//! | [`scenario`] | reply scenario selection |
//! | [`engine`] | the per-query entry point |

pub mod alias;
pub mod attributes;
pub mod budget;
pub mod catalog;
pub mod category;
pub mod engine;
pub mod escalation;
pub mod intent;
pub mod lexicon;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod rules;
pub mod scenario;
pub mod senses;
pub mod settings;
pub mod vocab;
