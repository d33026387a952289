//! Error types for mi-guide.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Interview error: {0}")]
    Interview(#[from] InterviewError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    /// The provider answered with an error body carrying a machine-readable code.
    #[error("Provider {provider} returned error {code}: {message}")]
    Api {
        provider: String,
        code: String,
        message: String,
    },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A rating outside the accepted 0-10 scale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error("{field} rating {value} is outside 0..=10")]
    OutOfRange { field: &'static str, value: u8 },
}

/// Errors raised by the interview flow itself (not by the oracle).
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    #[error("A response is already being generated")]
    GenerationInFlight,

    #[error("Invalid assessment: {0}")]
    Assessment(#[from] AssessmentError),

    #[error("No target behavior has been set yet")]
    NoTargetBehavior,
}

/// Conversation export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to serialize conversation: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
