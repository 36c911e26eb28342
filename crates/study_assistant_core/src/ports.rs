//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the generation pipeline.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generative backend, the secret store, text extraction
//! and persistence.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::GenerationResult;

//=========================================================================================
// Generation Error and Result Types
//=========================================================================================

/// The closed set of failures the pipeline can surface.
///
/// The `Display` text of every variant is the human-readable message shown to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("network connection failed, check your internet connection ({0})")]
    NetworkFailure(String),
    #[error("no valid API key is configured for the generation backend")]
    MissingCredential,
    #[error("the generation backend returned an unexpected response: {0}")]
    InvalidResponseShape(String),
    #[error("the generation backend reported an error (HTTP {status}): {message}")]
    BackendError { status: u16, message: String },
    #[error("too many requests, retry in {} seconds", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },
    #[error("daily free quota exhausted, try again tomorrow")]
    DailyQuotaExceeded,
    #[error("content was blocked by safety filtering, likely due to source material")]
    SafetyBlocked,
    #[error("the generated content could not be read: {0}")]
    DecodeFailure(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("the request was cancelled")]
    Cancelled,
    /// A collaborator (file system, secret store) failed outside the pipeline proper.
    #[error("an unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Payload-free discriminant of [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NetworkFailure,
    MissingCredential,
    InvalidResponseShape,
    BackendError,
    RateLimited,
    DailyQuotaExceeded,
    SafetyBlocked,
    DecodeFailure,
    InvalidRequest,
    Cancelled,
    Unexpected,
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            GenerationError::MissingCredential => ErrorKind::MissingCredential,
            GenerationError::InvalidResponseShape(_) => ErrorKind::InvalidResponseShape,
            GenerationError::BackendError { .. } => ErrorKind::BackendError,
            GenerationError::RateLimited { .. } => ErrorKind::RateLimited,
            GenerationError::DailyQuotaExceeded => ErrorKind::DailyQuotaExceeded,
            GenerationError::SafetyBlocked => ErrorKind::SafetyBlocked,
            GenerationError::DecodeFailure(_) => ErrorKind::DecodeFailure,
            GenerationError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GenerationError::Cancelled => ErrorKind::Cancelled,
            GenerationError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Whether a user-initiated retry of the same request could succeed.
    ///
    /// This is about offering a "try again" action, not about the automatic
    /// retry loop, which is governed by `RetryPolicy`.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::NetworkFailure(_)
                | GenerationError::RateLimited { .. }
                | GenerationError::InvalidResponseShape(_)
                | GenerationError::BackendError { .. }
                | GenerationError::Cancelled
        )
    }
}

/// A convenience type alias for `Result<T, GenerationError>`.
pub type PortResult<T> = Result<T, GenerationError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends a prompt to the generative backend and returns the candidate text.
    ///
    /// Implementations apply the retry policy internally and stop as soon as
    /// `cancel` fires.
    async fn generate_text(&self, prompt: &str, cancel: &CancellationToken) -> PortResult<String>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_key(&self) -> PortResult<Option<String>>;

    async fn set_key(&self, key: &str) -> PortResult<()>;

    async fn delete_key(&self) -> PortResult<()>;
}

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Extracts the plain text of a document.
    async fn extract(&self, path: &Path) -> PortResult<String>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save(&self, result: &GenerationResult) -> PortResult<()>;

    async fn load(&self, id: Uuid) -> PortResult<GenerationResult>;
}
