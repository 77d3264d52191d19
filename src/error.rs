// src/error.rs

//! Unified error handling for the insights pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A raw fragment could not be coerced into a post record
    #[error("Invalid fragment field '{field}': {reason}")]
    Normalize { field: &'static str, reason: String },

    /// Classifier service request failed
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Insight write failed after the bounded reconnect-and-retry
    #[error("Persistence error: {cause}")]
    Persistence { cause: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a normalization error for a single fragment field.
    pub fn normalize(field: &'static str, reason: impl fmt::Display) -> Self {
        Self::Normalize {
            field,
            reason: reason.to_string(),
        }
    }

    /// Create a classifier transport error.
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::Classifier(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(cause: impl fmt::Display) -> Self {
        Self::Persistence {
            cause: cause.to_string(),
        }
    }
}
