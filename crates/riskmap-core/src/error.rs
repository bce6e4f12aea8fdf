//! Error types for riskmap

use thiserror::Error;

/// The main error type for riskmap operations
#[derive(Debug, Error)]
pub enum RiskMapError {
    #[error("Knowledge load error: {0}")]
    KnowledgeLoadError(String),

    #[error("Invalid rule document '{document}': {reason}")]
    InvalidRuleDocument { document: String, reason: String },

    #[error("Unknown rule kind '{kind}' in document '{document}'")]
    UnknownRuleKind { document: String, kind: String },

    #[error("Unsupported treatment area: {value} is not one of {allowed:?}")]
    UnsupportedArea { value: String, allowed: Vec<String> },

    #[error("Invalid landmark input: {0}")]
    InvalidLandmarks(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for riskmap operations
pub type Result<T> = std::result::Result<T, RiskMapError>;

impl From<toml::de::Error> for RiskMapError {
    fn from(err: toml::de::Error) -> Self {
        RiskMapError::TomlParseError(err.to_string())
    }
}

impl From<serde_json::Error> for RiskMapError {
    fn from(err: serde_json::Error) -> Self {
        RiskMapError::JsonError(err.to_string())
    }
}
