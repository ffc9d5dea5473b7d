//! Command implementations for the Smith CLI
//!
//! Shared input loaders live here; the core never touches files or the
//! network on its own, so the CLI owns all I/O.

mod categorize;
mod cgt;
mod rules;

pub use categorize::cmd_categorize;
pub use cgt::cmd_cgt;
pub use rules::cmd_rules_test;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use smith_core::{RuleSet, Transaction};

/// One row of a transaction batch CSV
#[derive(Debug, Deserialize)]
pub(crate) struct TransactionRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub payee: String,
    pub amount: f64,
    #[serde(default)]
    pub account: String,
}

pub(crate) fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file {}", path.display()))?;
    RuleSet::from_yaml(&content)
        .with_context(|| format!("Failed to parse rule file {}", path.display()))
}

pub(crate) fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open transaction file {}", path.display()))?;

    let mut transactions = Vec::new();
    for record in reader.deserialize() {
        let record: TransactionRecord = record.context("Invalid transaction row")?;
        transactions.push(Transaction {
            id: record.id,
            date: record.date,
            payee: record.payee,
            amount: record.amount,
            account: record.account,
            category: None,
            labels: Vec::new(),
        });
    }
    Ok(transactions)
}
