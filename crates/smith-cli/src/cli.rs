//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Smith - AI-assisted bookkeeping and CGT tracking
#[derive(Parser)]
#[command(name = "smith")]
#[command(about = "Categorize transactions and track capital gains", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to smith.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize a transaction batch against a rule file
    Categorize {
        /// CSV file of transactions (id,date,payee,amount,account)
        #[arg(short, long)]
        file: PathBuf,

        /// YAML rule file
        #[arg(short, long)]
        rules: PathBuf,

        /// Intelligence mode override: conservative, smart, aggressive
        #[arg(short, long)]
        mode: Option<String>,

        /// Enable the LLM fallback for transactions no rule matches
        #[arg(long)]
        llm: bool,

        /// Emit results as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Inspect rule files
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Compute CGT events from a trade ledger
    Cgt {
        /// CSV trade ledger (action,kind,asset,quantity,date,unit_price,fees)
        #[arg(short, long)]
        file: PathBuf,

        /// Only report this asset
        #[arg(long)]
        asset: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Show which rules match a payee
    Test {
        /// YAML rule file
        #[arg(short, long)]
        rules: PathBuf,

        /// Payee string to test
        payee: String,
    },
}
