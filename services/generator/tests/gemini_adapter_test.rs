//! Mock API tests for the generative backend adapter and the full pipeline.
//!
//! These tests use wiremock to simulate generateContent responses, including
//! quota failures, safety blocks and slow responses.

use generator_lib::adapters::{GeminiAdapter, GeminiSettings, MemoryCredentialStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use study_assistant_core::domain::Difficulty;
use study_assistant_core::ports::{GenerationError, TextGenerationService};
use study_assistant_core::retry::RetryPolicy;
use study_assistant_core::service::StudyGenerator;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "test-model";
const ENDPOINT: &str = "/models/test-model:generateContent";
const API_KEY: &str = "test-api-key";

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new()
        .with_network_delay(Duration::from_millis(10))
        .with_default_rate_limit_delay(Duration::from_millis(10))
}

fn adapter_with(base_url: &str, key: Option<&str>, retry: RetryPolicy, timeout: Duration) -> GeminiAdapter {
    let credentials = Arc::new(MemoryCredentialStore::new(key.map(str::to_string)));
    let settings = GeminiSettings {
        base_url: base_url.to_string(),
        model: MODEL.to_string(),
        timeout,
        max_output_tokens: 1024,
        temperature: 0.4,
    };
    GeminiAdapter::new(credentials, settings, retry).unwrap()
}

fn adapter(server: &MockServer) -> GeminiAdapter {
    adapter_with(&server.uri(), Some(API_KEY), fast_retry(), Duration::from_secs(5))
}

fn success_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP",
            "safetyRatings": [{ "category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE" }]
        }],
        "usageMetadata": { "promptTokenCount": 5, "candidatesTokenCount": 10, "totalTokenCount": 15 }
    })
}

fn quota_body(quota_id: &str, retry_delay: &str) -> Value {
    json!({
        "error": {
            "code": 429,
            "message": "You exceeded your current quota, please check your plan and billing details.",
            "status": "RESOURCE_EXHAUSTED",
            "details": [
                {
                    "@type": "type.googleapis.com/google.rpc.QuotaFailure",
                    "violations": [{
                        "quotaMetric": "generativelanguage.googleapis.com/generate_content_free_tier_requests",
                        "quotaId": quota_id
                    }]
                },
                { "@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": retry_delay }
            ]
        }
    })
}

#[tokio::test]
async fn sends_the_request_envelope_and_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", API_KEY))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "Make a quiz" }] }],
            "generationConfig": { "maxOutputTokens": 1024 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("{\"ok\":true}")))
        .expect(1)
        .mount(&server)
        .await;

    let text = adapter(&server)
        .generate_text("Make a quiz", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\":true}");
}

#[tokio::test]
async fn daily_quota_fails_on_the_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(quota_body("GenerateContentPerDayPerProjectPerModel", "0.01s")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::DailyQuotaExceeded);
}

#[tokio::test]
async fn transient_rate_limit_is_retried_with_the_same_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({ "contents": [{ "parts": [{ "text": "same prompt" }] }] })))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(quota_body("GenerateRequestsPerMinutePerProjectPerModel", "0.01s")),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({ "contents": [{ "parts": [{ "text": "same prompt" }] }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("done")))
        .expect(1)
        .mount(&server)
        .await;

    let text = adapter(&server)
        .generate_text("same prompt", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(text, "done");
}

#[tokio::test]
async fn rate_limit_surfaces_after_the_budget_is_spent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_string("not json"))
        .expect(3)
        .mount(&server)
        .await;

    let retry = fast_retry().with_max_retries(2);
    let err = adapter_with(&server.uri(), Some(API_KEY), retry, Duration::from_secs(5))
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::RateLimited {
            retry_after: Duration::from_millis(10)
        }
    );
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "API key not valid.", "status": "UNAUTHENTICATED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::MissingCredential);
}

#[tokio::test]
async fn server_error_reports_the_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::BackendError {
            status: 503,
            message: "The model is overloaded.".into()
        }
    );
}

#[tokio::test]
async fn safety_block_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {
                "blockReason": "SAFETY",
                "safetyRatings": [{ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::SafetyBlocked);
}

#[tokio::test]
async fn missing_key_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter_with(&server.uri(), None, fast_retry(), Duration::from_secs(5))
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::MissingCredential);
}

#[tokio::test]
async fn slow_responses_time_out_as_network_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let retry = fast_retry().with_max_retries(1);
    let err = adapter_with(&server.uri(), Some(API_KEY), retry, Duration::from_millis(100))
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::NetworkFailure(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_host_is_a_network_failure() {
    let adapter = adapter_with(
        "http://127.0.0.1:1",
        Some(API_KEY),
        fast_retry().with_max_retries(1),
        Duration::from_secs(2),
    );
    let err = adapter
        .generate_text("prompt", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::NetworkFailure(_)), "{err:?}");
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn cancellation_stops_the_back_off() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_json(quota_body("PerMinute", "30s")))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        adapter(&server).generate_text("prompt", &cancel),
    )
    .await
    .expect("cancellation should end the retry loop");
    assert_eq!(outcome, Err(GenerationError::Cancelled));
}

#[tokio::test]
async fn pipeline_decodes_a_fenced_quiz_with_default_time_limit() {
    let questions: Vec<Value> = (1..=5)
        .map(|n| {
            json!({
                "id": format!("q-{n}"),
                "question": format!("Question {n}?"),
                "options": ["Alpha", "Beta", "Gamma"],
                "correctAnswer": "Beta",
                "explanation": "Beta is right."
            })
        })
        .collect();
    let text = format!(
        "Here is the result:\n```json\n{}\n```",
        json!({ "title": "Cells", "questions": questions })
    );

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&text)))
        .expect(1)
        .mount(&server)
        .await;

    let generator = StudyGenerator::new(Arc::new(adapter(&server)));
    let quiz = generator
        .generate_quiz("Cells are the basic unit of life.", 5, Difficulty::Easy, "English")
        .await
        .unwrap();

    assert_eq!(quiz.questions.len(), 5);
    assert_eq!(quiz.time_limit, 300);
    assert_eq!(quiz.title, "Cells");
    assert!(quiz.questions.iter().all(|q| !q.id.is_nil()));
    assert!(!generator.status().processing);
}
