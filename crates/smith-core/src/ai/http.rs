//! HTTP backend implementation
//!
//! Client for an Ollama-style generate API. The model endpoint is supplied
//! by the orchestration layer; this client owns no retry or timeout policy.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::parsing::parse_decision;
use super::{LlmBackend, LlmDecision};

/// HTTP backend for an Ollama-compatible server
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMITH_LLM_HOST").ok()?;
        let model = std::env::var("SMITH_LLM_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }
}

/// Request to the generate API
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from the generate API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl LlmBackend for HttpBackend {
    async fn categorize(&self, prompt: &str) -> Result<LlmDecision> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::LlmUnavailable(
                response.error_for_status().unwrap_err(),
            ));
        }

        let generate_response: GenerateResponse = response.json().await?;
        debug!("LLM response: {}", generate_response.response);

        parse_decision(&generate_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
