//! JSON parsing helpers for LLM responses
//!
//! Models often wrap the JSON payload in extra prose; these helpers extract
//! the first JSON object and map it into a typed decision.

use crate::error::{Error, Result};

use super::LlmDecision;

/// Raw decision as the model emits it. Confidence arrives as a float because
/// some models insist on `85.0`; it is clamped and rounded to 0-100.
#[derive(Debug, serde::Deserialize)]
struct RawDecision {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Parse a categorization decision from an LLM response
pub fn parse_decision(response: &str) -> Result<LlmDecision> {
    let response = response.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(Error::LlmParse(format!(
                "No JSON found in LLM response | Raw: {}",
                truncate(response)
            )))
        }
    };

    let raw: RawDecision = serde_json::from_str(json_str).map_err(|e| {
        Error::LlmParse(format!("Invalid JSON from LLM: {} | Raw: {}", e, truncate(json_str)))
    })?;

    let category = raw.category.and_then(|c| {
        let c = c.trim().to_string();
        if c.is_empty() || c.eq_ignore_ascii_case("null") || c.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(c)
        }
    });

    Ok(LlmDecision {
        category,
        confidence: raw.confidence.clamp(0.0, 100.0).round() as u8,
        reasoning: raw.reasoning.unwrap_or_default(),
    })
}

fn truncate(s: &str) -> String {
    if s.len() > 200 {
        format!("{}...", &s[..200])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision() {
        let response =
            r#"{"category": "Groceries", "confidence": 95, "reasoning": "supermarket chain"}"#;
        let decision = parse_decision(response).unwrap();
        assert_eq!(decision.category.as_deref(), Some("Groceries"));
        assert_eq!(decision.confidence, 95);
        assert_eq!(decision.reasoning, "supermarket chain");
    }

    #[test]
    fn test_parse_decision_with_surrounding_text() {
        let response = r#"Here's my assessment:
{"category": "Hardware & Garden", "confidence": 85, "reasoning": "hardware store"}
Hope that helps!"#;
        let decision = parse_decision(response).unwrap();
        assert_eq!(decision.category.as_deref(), Some("Hardware & Garden"));
        assert_eq!(decision.confidence, 85);
    }

    #[test]
    fn test_parse_decision_no_confident_match() {
        let decision = parse_decision(r#"{"category": null, "confidence": 20}"#).unwrap();
        assert!(decision.category.is_none());

        let decision = parse_decision(r#"{"category": "none", "confidence": 30}"#).unwrap();
        assert!(decision.category.is_none());
    }

    #[test]
    fn test_parse_decision_clamps_confidence() {
        let decision = parse_decision(r#"{"category": "Dining", "confidence": 140}"#).unwrap();
        assert_eq!(decision.confidence, 100);
        let decision = parse_decision(r#"{"category": "Dining", "confidence": -5}"#).unwrap();
        assert_eq!(decision.confidence, 0);
    }

    #[test]
    fn test_parse_decision_rejects_non_json() {
        assert!(parse_decision("I could not decide on a category.").is_err());
        assert!(parse_decision(r#"{"category": "#).is_err());
    }
}
