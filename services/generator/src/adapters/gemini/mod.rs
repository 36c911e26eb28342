//! services/generator/src/adapters/gemini/mod.rs
//!
//! This module contains the adapter for the hosted generative backend.
//! It implements the `TextGenerationService` port from the `core` crate: it wraps
//! the prompt in a generateContent request, sends it with a bounded timeout, and
//! retries transient failures according to the configured `RetryPolicy`.

pub mod errors;
pub mod response;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use study_assistant_core::ports::{
    CredentialStore, GenerationError, PortResult, TextGenerationService,
};
use study_assistant_core::retry::{RetryDecision, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::types::{GenerateContentRequest, GenerationConfig};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Connection and generation settings for the backend.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    /// Timeout of a single attempt.
    pub timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            max_output_tokens: 8192,
            temperature: 0.7,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` over HTTP.
#[derive(Clone)]
pub struct GeminiAdapter {
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
    settings: GeminiSettings,
    retry: RetryPolicy,
}

impl GeminiAdapter {
    /// Creates a new `GeminiAdapter`.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        settings: GeminiSettings,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            credentials,
            settings,
            retry,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// One transport attempt, classified.
    async fn send_once(&self, api_key: &str, request: &GenerateContentRequest) -> PortResult<String> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(errors::classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(errors::classify_transport)?;

        if status.is_success() {
            response::candidate_text(&body)
        } else {
            Err(errors::classify_status(
                status.as_u16(),
                &body,
                self.retry.default_rate_limit_delay,
            ))
        }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for GeminiAdapter {
    async fn generate_text(&self, prompt: &str, cancel: &CancellationToken) -> PortResult<String> {
        let api_key = self
            .credentials
            .get_key()
            .await?
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingCredential)?;

        let request = GenerateContentRequest::new(
            prompt,
            GenerationConfig {
                max_output_tokens: self.settings.max_output_tokens,
                temperature: self.settings.temperature,
            },
        );

        let mut budget = self.retry.budget();
        let mut attempt: u32 = 1;
        loop {
            debug!(attempt, model = %self.settings.model, "Sending generateContent request.");
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                outcome = self.send_once(&api_key, &request) => outcome,
            };

            let error = match outcome {
                Ok(text) => {
                    info!(attempt, chars = text.len(), "Backend returned generated text.");
                    return Ok(text);
                }
                Err(error) => error,
            };

            match budget.on_failure(&error) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt,
                        remaining = budget.remaining(),
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Backend attempt failed, retrying."
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    warn!(attempt, error = %error, "Backend request failed.");
                    return Err(error);
                }
            }
        }
    }
}
