//! # Storefront Brain CLI (`sb`)
//!
//! The `sb` binary runs the query-understanding engine against a catalog
//! export, for tuning vocabularies and checking what a shop assistant would
//! show for a given customer message.
//!
//! ## Usage
//!
//! ```bash
//! sb --config ./config/sb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sb init` | Write a starter config file |
//! | `sb query "<text>"` | Interpret one message and list the products it selects |
//! | `sb batch <file>` | Interpret one message per line |
//! | `sb index` | Summarize categories, prices and attribute vocabulary |
//! | `sb aliases` | Show which alias entries map onto catalog tokens |
//!
//! ## Examples
//!
//! ```bash
//! # Budget plus category
//! sb query "snowboard unter 400 euro"
//!
//! # Follow-up turn with context from the previous one
//! sb query "und was ist günstiger?" --intent bargain --category snowboard
//!
//! # Full outcome as JSON
//! sb query "trockene haut creme" --json
//!
//! # Regression file, JSON Lines out
//! sb batch queries.txt --json > outcomes.jsonl
//! ```

mod catalog;
mod config;
mod inspect;
mod logging;
mod query;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use storefront_brain_core::models::{Intent, PlanTier};

/// Storefront Brain CLI: deterministic query understanding for shop
/// assistants.
///
/// All commands except `init` read a TOML configuration file given by
/// `--config`.
#[derive(Parser)]
#[command(
    name = "sb",
    about = "Storefront Brain: deterministic query understanding for shop assistants",
    version,
    long_about = "Storefront Brain interprets free-text shopping messages against a product \
    catalog: intent, budget, category, attributes and unknown terms, and selects the products \
    a reply should show, or signals that the message needs a smarter answer."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/sb.toml`. Catalog and alias paths, engine
    /// tunables and the log level are read from this file.
    #[arg(long, global = true, default_value = "./config/sb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file at the `--config` path.
    Init,

    /// Interpret one customer message.
    ///
    /// Prints the understood intent, budget, category and escalation signal,
    /// then the selected products.
    Query {
        /// The customer message.
        text: String,

        /// Intent of the previous turn.
        #[arg(long, value_parser = parse_intent)]
        intent: Option<Intent>,

        /// Active category of the conversation (slug).
        #[arg(long)]
        category: Option<String>,

        /// Product ids recommended in the previous turn, comma-separated.
        #[arg(long, value_delimiter = ',')]
        previous: Vec<String>,

        /// Plan tier; overrides `[engine].plan`.
        #[arg(long, value_parser = parse_plan)]
        plan: Option<PlanTier>,

        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interpret every line of a file as a separate message.
    ///
    /// Blank lines and lines starting with `#` are skipped. Each line is a
    /// fresh conversation.
    Batch {
        /// File with one message per line.
        file: PathBuf,

        /// Print one JSON object per line.
        #[arg(long)]
        json: bool,
    },

    /// Summarize the catalog as the engine sees it.
    Index,

    /// List alias entries and whether they map onto catalog tokens.
    Aliases,
}

fn parse_intent(s: &str) -> Result<Intent, String> {
    s.parse()
}

fn parse_plan(s: &str) -> Result<PlanTier, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Init = cli.command {
        config::scaffold_config(&cli.config)?;
        println!("Wrote {}", cli.config.display());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_tracing(&cfg.logging.level);

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Query {
            text,
            intent,
            category,
            previous,
            plan,
            json,
        } => {
            let opts = query::QueryOptions {
                previous_intent: intent,
                category,
                previous,
                plan,
                json,
            };
            query::run_query(&cfg, &text, opts)?;
        }
        Commands::Batch { file, json } => {
            query::run_batch(&cfg, &file, json).await?;
        }
        Commands::Index => {
            inspect::run_index(&cfg)?;
        }
        Commands::Aliases => {
            inspect::run_aliases(&cfg)?;
        }
    }

    Ok(())
}
