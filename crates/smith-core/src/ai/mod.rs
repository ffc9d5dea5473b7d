//! Pluggable LLM backend abstraction
//!
//! The categorization flow treats the LLM as an external service behind a
//! small trait. All failure handling beyond "surface the error" belongs to
//! the caller; the core never retries.
//!
//! # Architecture
//!
//! - `LlmBackend` trait: the one operation the flow needs (categorize a
//!   prompt into a decision) plus health/identity accessors
//! - `LlmClient` enum: concrete wrapper providing Clone + compile-time
//!   dispatch
//! - Backend implementations: `HttpBackend` (Ollama-style generate API),
//!   `MockBackend` for tests and development
//!
//! # Configuration
//!
//! Environment variables:
//! - `SMITH_LLM_BACKEND`: Backend to use (http, mock). Default: http
//! - `SMITH_LLM_HOST`: LLM server URL (required for http backend)
//! - `SMITH_LLM_MODEL`: Model name (default: llama3.2)

mod http;
mod mock;
pub mod parsing;

pub use http::HttpBackend;
pub use mock::MockBackend;

/// Keyword-driven decision shared by the mock backend and the mock server in
/// `test_utils`; the prompt's quoted payee drives the answer.
pub fn mock_decision_for_payee(prompt: &str) -> LlmDecision {
    mock::decide_for_payee(&mock::extract_payee(prompt))
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A categorization decision returned by the LLM service
///
/// `category: None` means the model had no confident answer; the flow treats
/// that as the terminal `none` state, same as an unavailable backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmDecision {
    #[serde(default)]
    pub category: Option<String>,
    /// 0-100
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: String,
}

/// Trait defining the interface for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Categorize one transaction prompt into a decision
    async fn categorize(&self, prompt: &str) -> Result<LlmDecision>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete LLM client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum LlmClient {
    /// HTTP backend (Ollama-style generate API)
    Http(HttpBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl LlmClient {
    /// Create an LLM client from environment variables
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("SMITH_LLM_BACKEND").unwrap_or_else(|_| "http".to_string());

        match backend.to_lowercase().as_str() {
            "http" | "ollama" => HttpBackend::from_env().map(LlmClient::Http),
            "mock" => Some(LlmClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown SMITH_LLM_BACKEND, falling back to http");
                HttpBackend::from_env().map(LlmClient::Http)
            }
        }
    }

    /// Create an HTTP backend directly
    pub fn http(host: &str, model: &str) -> Self {
        LlmClient::Http(HttpBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        LlmClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl LlmBackend for LlmClient {
    async fn categorize(&self, prompt: &str) -> Result<LlmDecision> {
        match self {
            LlmClient::Http(b) => b.categorize(prompt).await,
            LlmClient::Mock(b) => b.categorize(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            LlmClient::Http(b) => b.health_check().await,
            LlmClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            LlmClient::Http(b) => b.model(),
            LlmClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            LlmClient::Http(b) => b.host(),
            LlmClient::Mock(b) => b.host(),
        }
    }
}
