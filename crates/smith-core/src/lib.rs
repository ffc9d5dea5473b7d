//! Smith Core Library
//!
//! Shared functionality for the Smith bookkeeping assistant:
//! - Declarative rule engine for category and label assignment
//! - Hybrid categorization flow with LLM fallback and rule learning
//! - FIFO capital-gains lot tracker with 12-month discount handling
//! - Pluggable LLM backends (Ollama-style HTTP, mock)
//! - Prompt library for the categorization prompt
//! - TOML configuration

pub mod ai;
pub mod cgt;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod prompts;
pub mod rules;

/// Test utilities including the mock LLM server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{HttpBackend, LlmBackend, LlmClient, LlmDecision, MockBackend};
pub use cgt::{AssetKind, AssetLot, CgtEvent, LotTracker, DISCOUNT_HOLDING_DAYS};
pub use config::{Config, LlmConfig};
pub use engine::{
    decide, propose_rule, should_ask_user, should_auto_apply, BatchEstimate,
    CategorizationOutcome, Categorizer, Decision, RuleCandidate,
};
pub use error::{Error, Result};
pub use models::{
    CategorizationResult, CategoryEntry, DecisionSource, IntelligenceMode, ModeThresholds,
    Transaction,
};
pub use rules::{
    apply_label_rules, categorize_and_label, match_category, CategoryRule, LabelRule,
    MatchCounters, PatternKind, RuleSet,
};
