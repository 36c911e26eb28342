//! services/generator/src/adapters/gemini/types.rs
//!
//! Structs that mirror the generateContent JSON envelopes: the request body,
//! the success response, and the error response with its typed details.

use serde::{Deserialize, Serialize};
use serde_json::Value;

//=========================================================================================
// Request
//=========================================================================================

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Debug)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

#[derive(Serialize, Debug)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerateContentRequest {
    /// Wraps a single prompt in the request envelope.
    pub fn new(prompt: &str, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }
}

//=========================================================================================
// Success Response
//=========================================================================================

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Deserialize, Debug)]
pub struct SafetyRating {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub probability: Option<String>,
    #[serde(default)]
    pub blocked: bool,
}

impl SafetyRating {
    /// Anything rated above negligible risk counts as flagged.
    pub fn is_flagged(&self) -> bool {
        self.blocked
            || !matches!(
                self.probability.as_deref(),
                None | Some("NEGLIGIBLE") | Some("HARM_PROBABILITY_UNSPECIFIED")
            )
    }
}

//=========================================================================================
// Error Response
//=========================================================================================

#[derive(Deserialize, Debug)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Kept untyped so one unrecognised detail cannot spoil the others.
    #[serde(default)]
    pub details: Vec<Value>,
}

impl ErrorBody {
    pub fn typed_details(&self) -> impl Iterator<Item = ErrorDetail> + '_ {
        self.details
            .iter()
            .filter_map(|detail| ErrorDetail::deserialize(detail).ok())
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "@type")]
pub enum ErrorDetail {
    #[serde(rename = "type.googleapis.com/google.rpc.QuotaFailure")]
    QuotaFailure {
        #[serde(default)]
        violations: Vec<QuotaViolation>,
    },
    #[serde(rename = "type.googleapis.com/google.rpc.RetryInfo")]
    RetryInfo {
        #[serde(default, rename = "retryDelay")]
        retry_delay: Option<String>,
    },
    #[serde(rename = "type.googleapis.com/google.rpc.ErrorInfo")]
    ErrorInfo {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaViolation {
    #[serde(default)]
    pub quota_metric: Option<String>,
    #[serde(default)]
    pub quota_id: Option<String>,
}
