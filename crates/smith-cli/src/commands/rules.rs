//! Test a payee against a rule file

use std::path::Path;

use anyhow::Result;

use smith_core::{apply_label_rules, match_category, Transaction};

pub fn cmd_rules_test(rules_path: &Path, payee: &str) -> Result<()> {
    let rules = super::load_rule_set(rules_path)?;

    // Probe transaction; amount/account-gated rules won't fire here
    let tx = Transaction {
        id: 0,
        date: chrono::Utc::now().date_naive(),
        payee: payee.to_string(),
        amount: 0.0,
        account: String::new(),
        category: None,
        labels: Vec::new(),
    };

    match match_category(&tx, &rules.categories)? {
        Some(winner) => {
            println!(
                "Winner: {} -> {} ({}%)",
                winner.name, winner.category, winner.confidence
            );
            let labels = apply_label_rules(&tx, Some(&winner.category), &rules.labels)?;
            if !labels.is_empty() {
                println!(
                    "Labels: {}",
                    labels.iter().cloned().collect::<Vec<_>>().join(", ")
                );
            }
        }
        None => println!("No category rule matches '{}'", payee),
    }

    // Every matching rule, for debugging overlaps
    let mut all_matches = Vec::new();
    for rule in &rules.categories {
        if rule.matches(&tx)? {
            all_matches.push(rule);
        }
    }
    if all_matches.len() > 1 {
        println!("\nAll matching rules (declaration order):");
        for rule in all_matches {
            println!("  {} -> {}", rule.name, rule.category);
        }
    }

    Ok(())
}
