//! Declarative rule engine for category and label assignment
//!
//! Rules are loaded from a YAML document and evaluated in declaration order.
//! Category rules short-circuit on the first match; label rules all
//! contribute and the resulting label set is a deduplicated union.
//!
//! Matching is pure: the same transaction and rule list always produce the
//! same result. Match counters live in a separate [`MatchCounters`] side
//! table updated by the caller, never inside the matching functions.

use std::collections::{BTreeSet, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{CategorizationResult, DecisionSource, Transaction};

/// How a rule's patterns are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Case-insensitive substring; pipe-separated alternatives allowed
    #[default]
    Contains,
    /// Full regex, matched against the payee as-is and uppercased
    Regex,
}

/// A category rule: first match in declaration order wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    /// Inclusion patterns over the payee; any one matching is enough
    #[serde(rename = "match")]
    pub patterns: Vec<String>,
    /// Exclusion patterns; any one matching vetoes the rule
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub pattern_kind: PatternKind,
    pub category: String,
    /// 0-100
    pub confidence: u8,
    /// Inclusive signed bounds on the transaction amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_max: Option<f64>,
    /// Account allow-list; empty = any account
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
}

impl CategoryRule {
    pub fn matches(&self, tx: &Transaction) -> Result<bool> {
        if let Some(min) = self.amount_min {
            if tx.amount < min {
                return Ok(false);
            }
        }
        if let Some(max) = self.amount_max {
            if tx.amount > max {
                return Ok(false);
            }
        }
        if !self.accounts.is_empty()
            && !self
                .accounts
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&tx.account))
        {
            return Ok(false);
        }

        let mut included = false;
        for pattern in &self.patterns {
            if pattern_matches(&tx.payee, pattern, self.pattern_kind)? {
                included = true;
                break;
            }
        }
        if !included {
            return Ok(false);
        }

        // Exclusion always wins over inclusion on the same rule
        for pattern in &self.exclude {
            if pattern_matches(&tx.payee, pattern, self.pattern_kind)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// A label rule: all matching rules contribute their labels
///
/// All populated conditions must hold. The category condition is evaluated
/// against the *resolved* category (rule- or LLM-assigned), not the raw
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRule {
    pub name: String,
    /// Resolved categories this rule applies to; empty = any category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
    /// Payee patterns; empty = any payee
    #[serde(rename = "match", default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub pattern_kind: PatternKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_max: Option<f64>,
    pub labels: Vec<String>,
    /// 0-100
    pub confidence: u8,
}

impl LabelRule {
    pub fn matches(&self, tx: &Transaction, resolved_category: Option<&str>) -> Result<bool> {
        if !self.categories.is_empty() {
            let Some(category) = resolved_category else {
                return Ok(false);
            };
            if !self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
            {
                return Ok(false);
            }
        }
        if !self.accounts.is_empty()
            && !self
                .accounts
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&tx.account))
        {
            return Ok(false);
        }
        if let Some(min) = self.amount_min {
            if tx.amount < min {
                return Ok(false);
            }
        }
        if let Some(max) = self.amount_max {
            if tx.amount > max {
                return Ok(false);
            }
        }
        if !self.patterns.is_empty() {
            let mut hit = false;
            for pattern in &self.patterns {
                if pattern_matches(&tx.payee, pattern, self.pattern_kind)? {
                    hit = true;
                    break;
                }
            }
            if !hit {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// The full declarative rule document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub labels: Vec<LabelRule>,
}

impl RuleSet {
    /// Parse a YAML rule document. Declaration order is preserved.
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }
}

/// Check if a payee matches a pattern
pub fn pattern_matches(payee: &str, pattern: &str, kind: PatternKind) -> Result<bool> {
    let payee_upper = payee.to_uppercase();

    match kind {
        PatternKind::Contains => {
            // Support pipe-separated OR patterns
            for p in pattern.split('|') {
                if payee_upper.contains(&p.to_uppercase()) {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        PatternKind::Regex => {
            let re = Regex::new(pattern)?;
            Ok(re.is_match(payee) || re.is_match(&payee_upper))
        }
    }
}

/// Phase 1: find the first category rule matching the transaction.
///
/// Declaration order is the only tie-breaker; earlier rules win. `None` is
/// the expected outcome when nothing matches, not an error.
pub fn match_category<'a>(
    tx: &Transaction,
    rules: &'a [CategoryRule],
) -> Result<Option<&'a CategoryRule>> {
    for rule in rules {
        if rule.matches(tx)? {
            debug!(payee = %tx.payee, rule = %rule.name, category = %rule.category, "category rule matched");
            return Ok(Some(rule));
        }
    }
    Ok(None)
}

/// Phase 2: union the labels of every matching label rule.
///
/// No short-circuit; contradictory rules are both honored. An empty set is a
/// valid result.
pub fn apply_label_rules(
    tx: &Transaction,
    resolved_category: Option<&str>,
    rules: &[LabelRule],
) -> Result<BTreeSet<String>> {
    let mut labels = BTreeSet::new();
    for rule in rules {
        if rule.matches(tx, resolved_category)? {
            debug!(payee = %tx.payee, rule = %rule.name, "label rule matched");
            labels.extend(rule.labels.iter().cloned());
        }
    }
    Ok(labels)
}

/// Run both phases against a rule set.
///
/// When no category rule matches, the category stays `None` and the caller
/// (the hybrid flow) finalizes source and confidence; the label pass only
/// runs once a category is resolved.
pub fn categorize_and_label(tx: &Transaction, rules: &RuleSet) -> Result<CategorizationResult> {
    match match_category(tx, &rules.categories)? {
        Some(rule) => {
            let labels = apply_label_rules(tx, Some(&rule.category), &rules.labels)?;
            Ok(CategorizationResult {
                category: Some(rule.category.clone()),
                labels,
                confidence: rule.confidence,
                source: DecisionSource::Rule,
                llm_used: false,
                reasoning: None,
            })
        }
        None => Ok(CategorizationResult::none(false)),
    }
}

/// Per-rule match counters, kept outside the pure matching functions
#[derive(Debug, Default, Clone)]
pub struct MatchCounters {
    counts: HashMap<String, u64>,
}

impl MatchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rule_name: &str) {
        *self.counts.entry(rule_name.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, rule_name: &str) -> u64 {
        self.counts.get(rule_name).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
