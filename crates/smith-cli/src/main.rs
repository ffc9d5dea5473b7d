//! Smith CLI - AI-assisted bookkeeping assistant
//!
//! Usage:
//!   smith categorize --file txns.csv --rules rules.yaml   Categorize a batch
//!   smith rules test --rules rules.yaml "PAYEE"           Test a payee
//!   smith cgt --file trades.csv                           Compute CGT events

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = match &cli.config {
        Some(path) => smith_core::Config::load_from(path)?,
        None => smith_core::Config::load()?,
    };

    match cli.command {
        Commands::Categorize {
            file,
            rules,
            mode,
            llm,
            json,
        } => commands::cmd_categorize(&config, &file, &rules, mode.as_deref(), llm, json).await,
        Commands::Rules { action } => match action {
            RulesAction::Test { rules, payee } => commands::cmd_rules_test(&rules, &payee),
        },
        Commands::Cgt { file, asset } => commands::cmd_cgt(&file, asset.as_deref()),
    }
}
