//! services/generator/src/error.rs
//!
//! Defines the primary error type for the generator service.

use crate::config::ConfigError;
use study_assistant_core::ports::GenerationError;

/// The primary error type for the `generator` service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the generation pipeline or its ports.
    #[error("{0}")]
    Generation(#[from] GenerationError),

    /// Represents a failure to set up the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a failure to serialize output.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., writing to stdout).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
