//! services/generator/src/adapters/gemini/response.rs
//!
//! Pulls the generated text out of a successful generateContent envelope,
//! rejecting safety-blocked responses first.

use study_assistant_core::ports::{GenerationError, PortResult};
use tracing::warn;

use super::types::GenerateContentResponse;

const SAFETY_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Returns the first candidate's text, or the error that explains its absence.
pub fn candidate_text(body: &str) -> PortResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::InvalidResponseShape(format!("response body is not a valid envelope: {}", e))
    })?;

    if is_safety_blocked(&response) {
        return Err(GenerationError::SafetyBlocked);
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        GenerationError::InvalidResponseShape("the response contains no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::InvalidResponseShape(
            "the first candidate has no text content".to_string(),
        ));
    }
    Ok(text)
}

fn is_safety_blocked(response: &GenerateContentResponse) -> bool {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            warn!(%reason, "Prompt was blocked by the backend.");
            return true;
        }
        if let Some(rating) = feedback.safety_ratings.iter().find(|r| r.is_flagged()) {
            warn!(category = ?rating.category, probability = ?rating.probability, "Prompt was flagged by safety filtering.");
            return true;
        }
    }

    response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        .is_some_and(|reason| SAFETY_FINISH_REASONS.contains(&reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_with_text(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP",
                "safetyRatings": [{ "category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE" }]
            }],
            "promptFeedback": {
                "safetyRatings": [{ "category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE" }]
            }
        })
        .to_string()
    }

    #[test]
    fn extracts_the_first_candidate_text() {
        assert_eq!(candidate_text(&envelope_with_text("{\"a\":1}")).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn joins_split_text_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        })
        .to_string();
        assert_eq!(candidate_text(&body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn flagged_rating_blocks_even_with_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{}" }] } }],
            "promptFeedback": {
                "safetyRatings": [{ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "MEDIUM" }]
            }
        })
        .to_string();
        assert_eq!(candidate_text(&body), Err(GenerationError::SafetyBlocked));
    }

    #[test]
    fn block_reason_without_candidates_is_safety_blocked() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
        assert_eq!(candidate_text(&body), Err(GenerationError::SafetyBlocked));
    }

    #[test]
    fn safety_finish_reason_is_safety_blocked() {
        let body = json!({ "candidates": [{ "finishReason": "SAFETY" }] }).to_string();
        assert_eq!(candidate_text(&body), Err(GenerationError::SafetyBlocked));
    }

    #[test]
    fn missing_candidates_is_invalid_shape() {
        assert!(matches!(
            candidate_text("{}"),
            Err(GenerationError::InvalidResponseShape(_))
        ));
        assert!(matches!(
            candidate_text(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
            Err(GenerationError::InvalidResponseShape(_))
        ));
        assert!(matches!(
            candidate_text("<html>"),
            Err(GenerationError::InvalidResponseShape(_))
        ));
    }
}
