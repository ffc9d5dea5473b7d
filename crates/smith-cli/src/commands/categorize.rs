//! Categorize a transaction batch against a rule file

use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::warn;

use smith_core::{
    match_category, Categorizer, CategoryEntry, Config, Decision, IntelligenceMode, LlmBackend,
    MatchCounters, RuleCandidate, RuleSet,
};

pub async fn cmd_categorize(
    config: &Config,
    file: &Path,
    rules_path: &Path,
    mode_override: Option<&str>,
    use_llm: bool,
    json: bool,
) -> Result<()> {
    let rules = super::load_rule_set(rules_path)?;
    let transactions = super::load_transactions(file)?;

    let mode: IntelligenceMode = match mode_override {
        Some(s) => s.parse().map_err(|e: String| anyhow!(e))?,
        None => config.mode,
    };

    let llm = if use_llm {
        let client = config.llm_client();
        match &client {
            Some(client) => {
                if !client.health_check().await {
                    warn!(host = %client.host(), "LLM backend is not responding; unmatched transactions will fall through");
                }
            }
            None => {
                warn!("--llm requested but no LLM backend is configured; unmatched transactions will be skipped");
            }
        }
        client
    } else {
        None
    };

    let catalog = catalog_from_rules(&rules);
    let categorizer = Categorizer::new(&rules, &catalog, llm.as_ref(), mode)
        .with_learning_threshold(config.learning_threshold);

    let estimate = categorizer.estimate_batch(&transactions)?;
    if estimate.should_delegate() {
        println!(
            "Note: {} of {} transactions need LLM calls (~{} tokens); consider delegating this batch to a worker.",
            estimate.needing_llm, estimate.transactions, estimate.estimated_tokens
        );
    }

    let mut counters = MatchCounters::new();
    let mut proposals: Vec<RuleCandidate> = Vec::new();
    let mut applied = 0usize;
    let mut to_confirm = 0usize;
    let mut skipped = 0usize;

    for tx in &transactions {
        // Side-table match counting, outside the pure matcher
        if let Some(rule) = match_category(tx, &rules.categories)? {
            counters.record(&rule.name);
        }

        let result = categorizer.categorize(tx).await?;
        let decision = categorizer.decide(&result);
        match decision {
            Decision::AutoApply => applied += 1,
            Decision::AskUser => to_confirm += 1,
            Decision::Skip => skipped += 1,
        }

        if json {
            println!(
                "{}",
                serde_json::json!({
                    "id": tx.id,
                    "payee": tx.payee,
                    "category": result.category,
                    "labels": result.labels,
                    "confidence": result.confidence,
                    "source": result.source,
                    "reasoning": result.reasoning,
                    "decision": decision,
                })
            );
        } else {
            let category = result.category.as_deref().unwrap_or("-");
            let labels = if result.labels.is_empty() {
                String::new()
            } else {
                format!(
                    " [{}]",
                    result.labels.iter().cloned().collect::<Vec<_>>().join(", ")
                )
            };
            println!(
                "{:>6}  {:<40}  {:<20}{}  {:>3}%  {:<4}  {:?}",
                tx.id,
                truncate(&tx.payee, 40),
                category,
                labels,
                result.confidence,
                result.source,
                decision
            );
        }

        if let Some(candidate) = categorizer.propose(tx, &result) {
            if !proposals.contains(&candidate) {
                proposals.push(candidate);
            }
        }
    }

    if !json {
        println!();
        println!(
            "{} transactions: {} auto-applied, {} need confirmation, {} skipped (mode: {})",
            transactions.len(),
            applied,
            to_confirm,
            skipped,
            mode
        );

        let mut counts: Vec<_> = counters.iter().collect();
        if !counts.is_empty() {
            counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            println!("\nRule matches:");
            for (name, count) in counts {
                println!("  {:<30} {}", name, count);
            }
        }

        if !proposals.is_empty() {
            println!("\nProposed rules (review before adding to {}):", rules_path.display());
            for candidate in &proposals {
                println!("---\n{}", candidate.to_yaml()?);
            }
        }
    }

    Ok(())
}

/// Stand-in category catalog derived from the rule file's target categories.
/// A real deployment passes the upstream category catalog instead.
fn catalog_from_rules(rules: &RuleSet) -> Vec<CategoryEntry> {
    let mut seen = Vec::new();
    let mut catalog = Vec::new();
    for rule in &rules.categories {
        if !seen.contains(&rule.category) {
            seen.push(rule.category.clone());
            catalog.push(CategoryEntry::new(&rule.category));
        }
    }
    catalog
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}…", cut)
    } else {
        s.to_string()
    }
}
