//! Hybrid categorization flow
//!
//! Wraps the rule engine with an LLM fallback, a confidence-gated decision
//! step, and rule learning. Per transaction the flow is: rules first; on no
//! match, build a prompt and ask the LLM; re-run the label pass with the
//! resolved category; gate the decision by intelligence mode.
//!
//! LLM responses are cached per-session by payee to avoid repeated calls for
//! the same merchant within one batch.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::{LlmBackend, LlmClient, LlmDecision};
use crate::error::Result;
use crate::models::{
    CategorizationResult, CategoryEntry, DecisionSource, IntelligenceMode, Transaction,
};
use crate::prompts::{self, Prompt, PromptId};
use crate::rules::{apply_label_rules, categorize_and_label, match_category, CategoryRule, PatternKind, RuleSet};

/// LLM-sourced decisions at or above this confidence produce a rule proposal
pub const DEFAULT_LEARNING_THRESHOLD: u8 = 90;

/// Batches with more transactions needing LLM calls than this should be
/// delegated to a parallel worker instead of processed inline
pub const DELEGATION_BATCH_THRESHOLD: usize = 100;

/// Estimated-token budget above which a batch should be delegated
pub const DELEGATION_TOKEN_BUDGET: usize = 50_000;

/// What to do with a categorization decision at the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AutoApply,
    AskUser,
    /// Below the ask floor; no action and no prompt
    Skip,
}

/// True iff the confidence clears the mode's auto-apply threshold.
/// Conservative has no reachable threshold and never auto-applies.
pub fn should_auto_apply(confidence: u8, mode: IntelligenceMode) -> bool {
    match mode.thresholds().auto_apply {
        Some(threshold) => confidence >= threshold,
        None => false,
    }
}

/// True iff the confidence lands in the ask window: at or above the mode's
/// ask floor but below its auto-apply threshold.
pub fn should_ask_user(confidence: u8, mode: IntelligenceMode) -> bool {
    confidence >= mode.thresholds().ask_floor && !should_auto_apply(confidence, mode)
}

/// Gate a confidence through the mode thresholds
pub fn decide(confidence: u8, mode: IntelligenceMode) -> Decision {
    if should_auto_apply(confidence, mode) {
        Decision::AutoApply
    } else if should_ask_user(confidence, mode) {
        Decision::AskUser
    } else {
        Decision::Skip
    }
}

/// Outcome of the rules-only pass over one transaction
///
/// `NeedsLlm` carries everything an orchestration layer holding model access
/// needs to execute the call and feed the decision back through
/// [`Categorizer::resolve_with_decision`].
#[derive(Debug, Clone)]
pub enum CategorizationOutcome {
    Resolved(CategorizationResult),
    NeedsLlm { transaction_id: i64, prompt: String },
}

/// A candidate category rule learned from an LLM decision
///
/// Surfaced for human approval; the core never persists it into the active
/// rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCandidate {
    pub pattern: String,
    pub category: String,
    pub confidence: u8,
}

impl RuleCandidate {
    /// Materialize the candidate as a category rule
    pub fn to_rule(&self) -> CategoryRule {
        CategoryRule {
            name: self.pattern.to_lowercase().replace(' ', "-"),
            patterns: vec![self.pattern.clone()],
            exclude: Vec::new(),
            pattern_kind: PatternKind::Contains,
            category: self.category.clone(),
            confidence: self.confidence,
            amount_min: None,
            amount_max: None,
            accounts: Vec::new(),
        }
    }

    /// Render the candidate as a YAML snippet for the rule file
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_rule())?)
    }
}

/// Leading alphabetic token sequence of a payee, uppercased
///
/// "WOOLWORTHS METRO 123" -> "WOOLWORTHS METRO"; payees that open with a
/// non-alphabetic token yield nothing.
fn merchant_token(payee: &str) -> Option<String> {
    let tokens: Vec<&str> = payee
        .split_whitespace()
        .take_while(|t| t.chars().all(|c| c.is_ascii_alphabetic()))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" ").to_uppercase())
    }
}

/// Derive a rule candidate from an LLM decision
///
/// Pure function: only LLM decisions with a category and confidence at or
/// above the learning threshold qualify, and only when a merchant token can
/// be extracted from the payee.
pub fn propose_rule(
    tx: &Transaction,
    decision: &LlmDecision,
    learning_threshold: u8,
) -> Option<RuleCandidate> {
    let category = decision.category.as_deref()?;
    if decision.confidence < learning_threshold {
        return None;
    }
    let pattern = merchant_token(&tx.payee)?;
    Some(RuleCandidate {
        pattern,
        category: category.to_string(),
        confidence: decision.confidence,
    })
}

/// Complexity estimate for a batch, exposed for the delegation contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEstimate {
    pub transactions: usize,
    /// Transactions no category rule matched
    pub needing_llm: usize,
    /// Rough prompt-token estimate for the LLM-bound portion
    pub estimated_tokens: usize,
    /// LLM-bound transactions are independent of each other
    pub parallelizable: bool,
}

impl BatchEstimate {
    /// Whether the batch should be handed to a parallel worker rather than
    /// processed inline. Actual worker dispatch is the caller's job.
    pub fn should_delegate(&self) -> bool {
        self.needing_llm > DELEGATION_BATCH_THRESHOLD
            || self.estimated_tokens > DELEGATION_TOKEN_BUDGET
    }
}

/// Orchestrates rules, LLM fallback, decision gating and rule learning
pub struct Categorizer<'a> {
    rules: &'a RuleSet,
    catalog: &'a [CategoryEntry],
    llm: Option<&'a LlmClient>,
    mode: IntelligenceMode,
    learning_threshold: u8,
    prompt: Prompt,
    /// Per-session cache for LLM decisions (payee -> decision)
    llm_cache: Mutex<HashMap<String, Option<LlmDecision>>>,
}

impl<'a> Categorizer<'a> {
    pub fn new(
        rules: &'a RuleSet,
        catalog: &'a [CategoryEntry],
        llm: Option<&'a LlmClient>,
        mode: IntelligenceMode,
    ) -> Self {
        Self {
            rules,
            catalog,
            llm,
            mode,
            learning_threshold: DEFAULT_LEARNING_THRESHOLD,
            prompt: prompts::load(PromptId::CategorizeTransaction),
            llm_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_learning_threshold(mut self, threshold: u8) -> Self {
        self.learning_threshold = threshold;
        self
    }

    pub fn mode(&self) -> IntelligenceMode {
        self.mode
    }

    /// Build the categorization prompt for one transaction
    pub fn build_prompt(&self, tx: &Transaction) -> String {
        prompts::build_categorization_prompt(&self.prompt, tx, self.catalog)
    }

    /// Rules-only pass; never touches the network.
    ///
    /// Callers that hold model access elsewhere pattern-match on the outcome
    /// instead of checking a marker field.
    pub fn plan(&self, tx: &Transaction) -> Result<CategorizationOutcome> {
        let result = categorize_and_label(tx, self.rules)?;
        if result.category.is_some() {
            Ok(CategorizationOutcome::Resolved(result))
        } else {
            Ok(CategorizationOutcome::NeedsLlm {
                transaction_id: tx.id,
                prompt: self.build_prompt(tx),
            })
        }
    }

    /// Full flow for one transaction, including the LLM fallback when a
    /// backend is attached. LLM failure degrades to the terminal `none`
    /// state; it is never retried here.
    pub async fn categorize(&self, tx: &Transaction) -> Result<CategorizationResult> {
        match self.plan(tx)? {
            CategorizationOutcome::Resolved(result) => Ok(result),
            CategorizationOutcome::NeedsLlm { prompt, .. } => {
                let Some(llm) = self.llm else {
                    return Ok(CategorizationResult::none(false));
                };
                match self.ask_llm(llm, tx, &prompt).await {
                    Some(decision) if decision.category.is_some() => {
                        self.resolve_with_decision(tx, &decision)
                    }
                    _ => Ok(CategorizationResult::none(true)),
                }
            }
        }
    }

    /// Resolved path of the delegation contract: fold an externally obtained
    /// LLM decision back in and re-run the label pass with its category.
    pub fn resolve_with_decision(
        &self,
        tx: &Transaction,
        decision: &LlmDecision,
    ) -> Result<CategorizationResult> {
        let Some(category) = decision.category.as_deref() else {
            return Ok(CategorizationResult::none(true));
        };
        let labels = apply_label_rules(tx, Some(category), &self.rules.labels)?;
        Ok(CategorizationResult {
            category: Some(category.to_string()),
            labels,
            confidence: decision.confidence,
            source: DecisionSource::Llm,
            llm_used: true,
            reasoning: Some(decision.reasoning.clone()),
        })
    }

    /// Gate a result through the mode thresholds
    pub fn decide(&self, result: &CategorizationResult) -> Decision {
        if result.category.is_none() {
            Decision::Skip
        } else {
            decide(result.confidence, self.mode)
        }
    }

    /// Propose a rule from an LLM-sourced result, if it qualifies
    pub fn propose(&self, tx: &Transaction, result: &CategorizationResult) -> Option<RuleCandidate> {
        if result.source != DecisionSource::Llm {
            return None;
        }
        let decision = LlmDecision {
            category: result.category.clone(),
            confidence: result.confidence,
            reasoning: result.reasoning.clone().unwrap_or_default(),
        };
        propose_rule(tx, &decision, self.learning_threshold)
    }

    /// Complexity estimate for the delegation contract
    pub fn estimate_batch(&self, txs: &[Transaction]) -> Result<BatchEstimate> {
        let mut needing_llm = 0;
        let mut estimated_tokens = 0;
        for tx in txs {
            if match_category(tx, &self.rules.categories)?.is_none() {
                needing_llm += 1;
                // ~4 chars per token is close enough for a budget check
                estimated_tokens += self.build_prompt(tx).len() / 4;
            }
        }
        Ok(BatchEstimate {
            transactions: txs.len(),
            needing_llm,
            estimated_tokens,
            parallelizable: needing_llm > 1,
        })
    }

    async fn ask_llm(
        &self,
        llm: &LlmClient,
        tx: &Transaction,
        prompt: &str,
    ) -> Option<LlmDecision> {
        {
            let cache = self.llm_cache.lock().unwrap();
            if let Some(cached) = cache.get(&tx.payee) {
                debug!(payee = %tx.payee, "LLM cache hit");
                return cached.clone();
            }
        }

        let decision = match llm.categorize(prompt).await {
            Ok(decision) => Some(decision),
            Err(e) => {
                warn!(payee = %tx.payee, error = %e, "LLM categorization failed");
                None
            }
        };

        // Cache the result (including None for failed lookups)
        self.llm_cache
            .lock()
            .unwrap()
            .insert(tx.payee.clone(), decision.clone());

        decision
    }
}
