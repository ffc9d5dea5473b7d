//! Prompt library for LLM categorization
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/smith/prompts/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to customize prompts without modifying the source,
//! while automatically getting new default prompts on upgrade.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::models::{CategoryEntry, Transaction};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CATEGORIZE_TRANSACTION: &str =
        include_str!("../../../prompts/categorize_transaction.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    CategorizeTransaction,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategorizeTransaction => "categorize_transaction",
        }
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::CategorizeTransaction => defaults::CATEGORIZE_TRANSACTION,
        }
    }
}

/// A loaded prompt template
#[derive(Debug, Clone)]
pub struct Prompt {
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
}

impl Prompt {
    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section with `{{var}}` template variables replaced
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        let mut result = self
            .user_section()
            .unwrap_or(self.content.as_str())
            .to_string();
        for (key, value) in vars {
            let pattern = format!("{{{{{}}}}}", key);
            result = result.replace(&pattern, value);
        }
        result
    }
}

/// Directory searched for prompt overrides
pub fn override_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("smith").join("prompts"))
}

/// Load a prompt, preferring a user override when one exists and reads
pub fn load(id: PromptId) -> Prompt {
    if let Some(dir) = override_dir() {
        let path = dir.join(format!("{}.md", id.as_str()));
        if let Ok(content) = fs::read_to_string(&path) {
            return Prompt {
                content,
                is_override: true,
            };
        }
    }
    Prompt {
        content: id.default_content().to_string(),
        is_override: false,
    }
}

/// Build the categorization prompt for one transaction
pub fn build_categorization_prompt(
    prompt: &Prompt,
    tx: &Transaction,
    catalog: &[CategoryEntry],
) -> String {
    let categories = catalog
        .iter()
        .map(|entry| match &entry.parent {
            Some(parent) => format!("- {} (under {})", entry.title, parent),
            None => format!("- {}", entry.title),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("payee", tx.payee.clone());
    vars.insert("amount", format!("{:.2}", tx.amount));
    vars.insert("date", tx.date.format("%Y-%m-%d").to_string());
    vars.insert("categories", categories);

    prompt.render_user(&vars)
}

/// Extract a markdown section by heading, up to the next `# ` heading
fn extract_section<'a>(content: &'a str, heading: &str) -> Option<&'a str> {
    let start = content.find(heading)? + heading.len();
    let rest = &content[start..];
    let end = rest.find("\n# ").unwrap_or(rest.len());
    Some(rest[..end].trim())
}
