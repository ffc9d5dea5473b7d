//! Domain models for Smith

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A bank transaction as supplied by the external transaction source.
///
/// Read-only input to the categorization flow. The core never mutates a
/// transaction; every evaluation produces a fresh [`CategorizationResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    /// Raw payee/merchant string from the bank feed
    pub payee: String,
    /// Negative = expense, positive = income
    pub amount: f64,
    /// Account identifier from the upstream ledger
    pub account: String,
    /// Category already present upstream, if any
    pub category: Option<String>,
    /// Labels already present upstream, if any
    #[serde(default)]
    pub labels: Vec<String>,
}

/// An entry in the category catalog supplied by the caller.
///
/// Used only to render the category list into the LLM prompt; the core does
/// not validate categories against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub title: String,
    pub parent: Option<String>,
}

impl CategoryEntry {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            parent: None,
        }
    }

    pub fn with_parent(title: &str, parent: &str) -> Self {
        Self {
            title: title.to_string(),
            parent: Some(parent.to_string()),
        }
    }
}

/// Where a categorization decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    /// A declarative category rule matched
    Rule,
    /// The LLM fallback supplied the category
    Llm,
    /// Nothing matched and the LLM had no confident answer
    #[default]
    None,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Llm => "llm",
            Self::None => "none",
        }
    }
}

impl std::str::FromStr for DecisionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule" => Ok(Self::Rule),
            "llm" => Ok(Self::Llm),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown decision source: {}", s)),
        }
    }
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of categorizing one transaction
///
/// Labels are kept in a `BTreeSet` so the set is deduplicated and
/// order-normalized; two results with the same labels always compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub category: Option<String>,
    pub labels: BTreeSet<String>,
    /// 0-100
    pub confidence: u8,
    pub source: DecisionSource,
    pub llm_used: bool,
    /// Present only when source is `llm`
    pub reasoning: Option<String>,
}

impl CategorizationResult {
    /// Terminal "nothing matched" result
    pub fn none(llm_used: bool) -> Self {
        Self {
            category: None,
            labels: BTreeSet::new(),
            confidence: 0,
            source: DecisionSource::None,
            llm_used,
            reasoning: None,
        }
    }
}

/// How aggressively categorization decisions are applied without confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntelligenceMode {
    /// Never auto-apply; every decision is confirmed by the user
    Conservative,
    #[default]
    Smart,
    Aggressive,
}

/// Confidence thresholds for one intelligence mode
///
/// `auto_apply` of `None` means auto-apply is unreachable at any confidence.
/// Anything below `ask_floor` is skipped without prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeThresholds {
    pub auto_apply: Option<u8>,
    pub ask_floor: u8,
}

impl IntelligenceMode {
    pub fn thresholds(&self) -> ModeThresholds {
        match self {
            Self::Conservative => ModeThresholds {
                auto_apply: None,
                ask_floor: 0,
            },
            Self::Smart => ModeThresholds {
                auto_apply: Some(90),
                ask_floor: 70,
            },
            Self::Aggressive => ModeThresholds {
                auto_apply: Some(80),
                ask_floor: 50,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Smart => "smart",
            Self::Aggressive => "aggressive",
        }
    }
}

impl std::str::FromStr for IntelligenceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "smart" => Ok(Self::Smart),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(format!("Unknown intelligence mode: {}", s)),
        }
    }
}

impl std::fmt::Display for IntelligenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for mode in [
            IntelligenceMode::Conservative,
            IntelligenceMode::Smart,
            IntelligenceMode::Aggressive,
        ] {
            let parsed: IntelligenceMode = mode.as_str().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert!("bold".parse::<IntelligenceMode>().is_err());
    }

    #[test]
    fn test_thresholds_ordering() {
        // conservative (unreachable) > smart > aggressive
        let smart = IntelligenceMode::Smart.thresholds();
        let aggressive = IntelligenceMode::Aggressive.thresholds();
        assert_eq!(
            IntelligenceMode::Conservative.thresholds().auto_apply,
            None
        );
        assert!(smart.auto_apply.unwrap() > aggressive.auto_apply.unwrap());
        assert!(smart.ask_floor > aggressive.ask_floor);
    }

    #[test]
    fn test_label_sets_compare_order_independent() {
        let mut a = BTreeSet::new();
        a.insert("work".to_string());
        a.insert("gst".to_string());
        let mut b = BTreeSet::new();
        b.insert("gst".to_string());
        b.insert("work".to_string());
        assert_eq!(a, b);
    }
}
