//! services/generator/src/adapters/gemini/errors.rs
//!
//! Maps transport failures and non-success HTTP responses into `GenerationError`.
//! Classification reads the status code and the structured error envelope only.

use std::time::Duration;
use study_assistant_core::ports::GenerationError;

use super::types::{ErrorDetail, ErrorEnvelope};

const DAILY_QUOTA_MARKER: &str = "PerDay";
const INVALID_KEY_REASON: &str = "API_KEY_INVALID";

/// Rate-limit metadata decoded from a 429 body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub retry_delay: Duration,
    pub is_daily_quota: bool,
}

impl RateLimitInfo {
    /// Decodes the quota-failure and retry-info details. Never fails: a body
    /// without usable details yields a transient limit with `default_delay`.
    pub fn from_body(body: &str, default_delay: Duration) -> Self {
        let mut info = RateLimitInfo {
            retry_delay: default_delay,
            is_daily_quota: false,
        };
        let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
            return info;
        };

        for detail in envelope.error.typed_details() {
            match detail {
                ErrorDetail::QuotaFailure { violations } => {
                    if violations.iter().any(|v| {
                        v.quota_id
                            .as_deref()
                            .is_some_and(|id| id.contains(DAILY_QUOTA_MARKER))
                    }) {
                        info.is_daily_quota = true;
                    }
                }
                ErrorDetail::RetryInfo {
                    retry_delay: Some(delay),
                } => {
                    if let Some(parsed) = parse_retry_delay(&delay) {
                        info.retry_delay = parsed;
                    }
                }
                _ => {}
            }
        }
        info
    }
}

/// Parses a protobuf duration string such as `"12s"` or `"1.5s"`.
pub fn parse_retry_delay(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().strip_suffix('s')?.trim().parse().ok()?;
    // Rejects negative, NaN and values too large for a Duration.
    Duration::try_from_secs_f64(seconds).ok()
}

/// Classifies a non-success HTTP response.
pub fn classify_status(status: u16, body: &str, default_rate_limit_delay: Duration) -> GenerationError {
    match status {
        401 => GenerationError::MissingCredential,
        429 => {
            let info = RateLimitInfo::from_body(body, default_rate_limit_delay);
            if info.is_daily_quota {
                GenerationError::DailyQuotaExceeded
            } else {
                GenerationError::RateLimited {
                    retry_after: info.retry_delay,
                }
            }
        }
        _ => {
            let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
            let key_rejected = envelope.as_ref().is_some_and(|e| {
                e.error.typed_details().any(|d| {
                    matches!(d, ErrorDetail::ErrorInfo { reason: Some(ref r) } if r == INVALID_KEY_REASON)
                })
            });
            if key_rejected {
                return GenerationError::MissingCredential;
            }

            let message = envelope
                .and_then(|e| e.error.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| default_message(status).to_string());
            GenerationError::BackendError { status, message }
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "the request was rejected as invalid",
        403 => "access to the generation model was denied",
        404 => "the generation model was not found",
        500..=599 => "the generation service is temporarily unavailable",
        _ => "the generation service answered with an unexpected status",
    }
}

/// Classifies a failure that happened before a complete HTTP response arrived.
pub fn classify_transport(err: reqwest::Error) -> GenerationError {
    // The request URL carries the API key as a query parameter.
    let err = err.without_url();
    if err.is_builder() {
        GenerationError::InvalidRequest(format!("could not build the backend request: {}", err))
    } else {
        GenerationError::NetworkFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEFAULT: Duration = Duration::from_secs(60);

    fn quota_body(quota_id: &str, retry_delay: Option<&str>) -> String {
        let mut details = vec![json!({
            "@type": "type.googleapis.com/google.rpc.QuotaFailure",
            "violations": [{
                "quotaMetric": "generativelanguage.googleapis.com/generate_content_free_tier_requests",
                "quotaId": quota_id
            }]
        })];
        if let Some(delay) = retry_delay {
            details.push(json!({
                "@type": "type.googleapis.com/google.rpc.RetryInfo",
                "retryDelay": delay
            }));
        }
        json!({
            "error": { "code": 429, "message": "You exceeded your current quota.", "status": "RESOURCE_EXHAUSTED", "details": details }
        })
        .to_string()
    }

    #[test]
    fn per_day_quota_is_daily() {
        let body = quota_body("GenerateContentPerDayPerProjectPerModel", Some("30s"));
        assert_eq!(classify_status(429, &body, DEFAULT), GenerationError::DailyQuotaExceeded);
    }

    #[test]
    fn per_minute_quota_uses_retry_info() {
        let body = quota_body("GenerateRequestsPerMinutePerProjectPerModel", Some("12s"));
        assert_eq!(
            classify_status(429, &body, DEFAULT),
            GenerationError::RateLimited {
                retry_after: Duration::from_secs(12)
            }
        );
    }

    #[test]
    fn malformed_429_body_falls_back_to_default_delay() {
        let unparseable_delay = quota_body("PerMinute", Some("soon"));
        for body in ["", "not json", r#"{"error": "flat"}"#, unparseable_delay.as_str()] {
            assert_eq!(
                classify_status(429, body, DEFAULT),
                GenerationError::RateLimited { retry_after: DEFAULT },
                "body: {body}"
            );
        }
    }

    #[test]
    fn unauthorized_is_missing_credential() {
        assert_eq!(classify_status(401, "", DEFAULT), GenerationError::MissingCredential);
    }

    #[test]
    fn invalid_key_reason_is_missing_credential() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{ "@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID" }]
            }
        })
        .to_string();
        assert_eq!(classify_status(400, &body, DEFAULT), GenerationError::MissingCredential);
    }

    #[test]
    fn backend_message_is_taken_from_the_envelope() {
        let body = r#"{"error":{"code":404,"message":"models/nope is not found","status":"NOT_FOUND"}}"#;
        assert_eq!(
            classify_status(404, body, DEFAULT),
            GenerationError::BackendError {
                status: 404,
                message: "models/nope is not found".into()
            }
        );
    }

    #[test]
    fn missing_message_uses_the_status_description() {
        assert_eq!(
            classify_status(503, "<html>upstream down</html>", DEFAULT),
            GenerationError::BackendError {
                status: 503,
                message: "the generation service is temporarily unavailable".into()
            }
        );
        assert_eq!(
            classify_status(403, "{}", DEFAULT),
            GenerationError::BackendError {
                status: 403,
                message: "access to the generation model was denied".into()
            }
        );
    }

    #[test]
    fn retry_delay_parsing() {
        assert_eq!(parse_retry_delay("12s"), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_delay(" 1.5s "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_delay("12"), None);
        assert_eq!(parse_retry_delay("-3s"), None);
        assert_eq!(parse_retry_delay("abcs"), None);
    }

    #[test]
    fn oversized_retry_delay_falls_back_to_default() {
        assert_eq!(parse_retry_delay("1e20s"), None);
        assert_eq!(parse_retry_delay("NaNs"), None);
        assert_eq!(parse_retry_delay("infs"), None);

        let body = quota_body("GenerateRequestsPerMinutePerProjectPerModel", Some("1e20s"));
        assert_eq!(
            classify_status(429, &body, DEFAULT),
            GenerationError::RateLimited { retry_after: DEFAULT }
        );
    }
}
