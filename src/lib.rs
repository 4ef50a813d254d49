//! # Storefront Brain
//!
//! Deterministic query understanding for conversational storefront
//! assistants.
//!
//! The engine itself lives in [`storefront_brain_core`] and is pure: it
//! takes a catalog snapshot, an alias lexicon and one customer message and
//! returns intent, budget, category, attribute filters, the selected
//! products and an escalation signal. This crate is the shell around it:
//! configuration, catalog file ingestion, logging and the `sb` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────────┐   ┌──────────────┐
//! │ catalog.json │──▶│        Engine          │──▶│ QueryOutcome │
//! │ aliases.json │   │ intent/budget/category │   │ products +   │
//! └──────────────┘   │ alias → pipeline       │   │ escalation   │
//!                    └────────────────────────┘   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`catalog`] | Catalog and alias file ingestion |
//! | [`query`] | `sb query` and `sb batch` |
//! | [`inspect`] | `sb index` and `sb aliases` |
//! | [`logging`] | Tracing subscriber setup |

pub mod catalog;
pub mod config;
pub mod inspect;
pub mod logging;
pub mod query;
