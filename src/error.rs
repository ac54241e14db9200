//! Domain-specific error types for hacs-validator

use thiserror::Error;

/// Main error type for the repository validator
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("GitHub API error: {message}")]
    Github { message: String },

    #[error("HTTP error: {message}")]
    Http { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Subprocess error: {message}")]
    Subprocess { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for ValidatorError {
    fn from(err: anyhow::Error) -> Self {
        ValidatorError::Internal {
            message: format!("{err:#}"),
        }
    }
}

impl From<serde_json::Error> for ValidatorError {
    fn from(err: serde_json::Error) -> Self {
        ValidatorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ValidatorError {
    fn from(err: toml::de::Error) -> Self {
        ValidatorError::Config {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ValidatorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ValidatorError::Http {
                message: format!("request timed out: {}", err),
            };
        }
        ValidatorError::Http {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<std::io::Error> for ValidatorError {
    fn from(err: std::io::Error) -> Self {
        ValidatorError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for validator operations
pub type Result<T> = std::result::Result<T, ValidatorError>;
