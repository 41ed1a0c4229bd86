//! Error types for the registry authorization engine
//!
//! Business-rule outcomes are never errors: a denied scope is an
//! [`AccessDecision`](crate::engine::AccessDecision) with `granted == false`.
//! The types here cover scope parsing (recovered as denies by the engine) and
//! loading policy or principal documents.

use thiserror::Error;

/// Scope parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Wrong number of `:`-delimited segments
    #[error("Malformed scope '{scope}': expected 'type:name:actions'")]
    Malformed {
        /// Raw scope as received
        scope: String,
    },

    /// Unknown resource type token
    #[error("Invalid scope type '{0}'")]
    InvalidType(String),
}

/// Policy token outside the supported vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported value '{0}'")]
pub struct UnknownToken(pub String);

/// Configuration and document loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML policy document
    #[error("Invalid policy document: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid JSON document
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;
