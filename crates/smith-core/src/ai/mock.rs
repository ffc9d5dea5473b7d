//! Mock backend for testing
//!
//! Returns keyword-driven decisions for well-known Australian merchants so
//! unit tests and development runs need no LLM server.

use async_trait::async_trait;

use crate::error::Result;

use super::{LlmBackend, LlmDecision};

/// Mock LLM backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self { healthy: true }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

/// Keyword-driven decision shared with the mock server in `test_utils`
pub(crate) fn decide_for_payee(payee: &str) -> LlmDecision {
    let p = payee.to_uppercase();

    let (category, confidence, reasoning) = if p.contains("WOOLWORTHS") || p.contains("COLES") {
        (Some("Groceries"), 95, "major supermarket chain")
    } else if p.contains("BUNNINGS") || p.contains("MITRE 10") || p.contains("HARDWARE") {
        (Some("Hardware & Garden"), 85, "hardware retailer")
    } else if p.contains("BP ") || p.contains("CALTEX") || p.contains("AMPOL") {
        (Some("Fuel"), 88, "service station")
    } else if p.contains("TELSTRA") || p.contains("OPTUS") {
        (Some("Utilities"), 92, "telco provider")
    } else if p.contains("UBER EATS") || p.contains("MENULOG") {
        (Some("Dining"), 82, "food delivery service")
    } else if p.contains("UBER") {
        (Some("Transport"), 80, "rideshare")
    } else if p.contains("CHEMIST") || p.contains("PHARMACY") {
        (Some("Health"), 86, "pharmacy")
    } else if p.contains("SALARY") || p.contains("PAYROLL") {
        (Some("Income"), 97, "payroll deposit")
    } else {
        (None, 25, "no confident match for this payee")
    };

    LlmDecision {
        category: category.map(|c| c.to_string()),
        confidence,
        reasoning: reasoning.to_string(),
    }
}

/// Pull the payee out of a categorization prompt. The template quotes it as
/// `Payee: "..."`; fall back to the whole prompt when absent.
pub(crate) fn extract_payee(prompt: &str) -> String {
    if let Some(start) = prompt.find("Payee: \"") {
        let after = &prompt[start + 8..];
        if let Some(end) = after.find('"') {
            return after[..end].to_string();
        }
    }
    prompt.to_string()
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn categorize(&self, prompt: &str) -> Result<LlmDecision> {
        Ok(decide_for_payee(&extract_payee(prompt)))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
