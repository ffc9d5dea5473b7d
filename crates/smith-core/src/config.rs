//! Configuration for Smith
//!
//! Loaded from `smith.toml` in the platform config directory (e.g.
//! `~/.config/smith/smith.toml` on Linux), with defaults when the file is
//! absent. Environment variables win over the file for the LLM endpoint so
//! a session can point at a different server without editing config.
//!
//! ```toml
//! mode = "smart"
//! learning_threshold = 90
//!
//! [llm]
//! backend = "http"
//! host = "http://localhost:11434"
//! model = "llama3.2"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ai::LlmClient;
use crate::engine::DEFAULT_LEARNING_THRESHOLD;
use crate::error::{Error, Result};
use crate::models::IntelligenceMode;

/// LLM endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "http" or "mock"
    pub backend: Option<String>,
    pub host: Option<String>,
    pub model: Option<String>,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: IntelligenceMode,
    #[serde(default = "default_learning_threshold")]
    pub learning_threshold: u8,
    #[serde(default)]
    pub llm: LlmConfig,
}

fn default_learning_threshold() -> u8 {
    DEFAULT_LEARNING_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: IntelligenceMode::default(),
            learning_threshold: DEFAULT_LEARNING_THRESHOLD,
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("smith").join("smith.toml"))
    }

    /// Load from the default location; defaults when no file exists
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Build an LLM client from the environment (first) or this config.
    /// Returns None when neither names a usable backend.
    pub fn llm_client(&self) -> Option<LlmClient> {
        if let Some(client) = LlmClient::from_env() {
            return Some(client);
        }
        match self.llm.backend.as_deref() {
            Some("mock") => Some(LlmClient::mock()),
            _ => {
                let host = self.llm.host.as_deref()?;
                let model = self.llm.model.as_deref().unwrap_or("llama3.2");
                Some(LlmClient::http(host, model))
            }
        }
    }
}
