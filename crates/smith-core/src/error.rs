//! Error types for Smith

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM backend unavailable: {0}")]
    LlmUnavailable(#[from] reqwest::Error),

    #[error("LLM response unparseable: {0}")]
    LlmParse(String),

    #[error("Rule error: {0}")]
    Rules(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid quantity: {0} (must be a positive, finite number)")]
    InvalidQuantity(f64),

    #[error("Insufficient lots for {asset}: tried to sell {requested} but only {available} held")]
    InsufficientLots {
        asset: String,
        requested: f64,
        available: f64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
