//! crates/study_assistant_core/src/service.rs
//!
//! The generation facade. Runs a request through prompt building, the backend
//! port, JSON isolation and decoding, and publishes its progress on a watch
//! channel for whoever presents it.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::decode::ContentDecoder;
use crate::domain::{
    DefinitionParameters, Difficulty, FlashcardParameters, FlashcardSet, GenerationParameters,
    GenerationRequest, GenerationResult, Glossary, Quiz, QuizParameters, SummaryLength,
    SummaryParameters, TextSummary,
};
use crate::extract::isolate_json;
use crate::ports::{GenerationError, PortResult, TextGenerationService};
use crate::prompt::build_prompt;

/// Progress snapshot of the most recent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStatus {
    pub processing: bool,
    pub message: String,
}

impl GenerationStatus {
    fn idle() -> Self {
        Self {
            processing: false,
            message: String::new(),
        }
    }
}

/// Generates study content from document text.
///
/// Concurrent calls are allowed; the published status always reflects the most
/// recent stage of whichever call updated it last.
pub struct StudyGenerator {
    backend: Arc<dyn TextGenerationService>,
    status: watch::Sender<GenerationStatus>,
}

impl StudyGenerator {
    pub fn new(backend: Arc<dyn TextGenerationService>) -> Self {
        let (status, _) = watch::channel(GenerationStatus::idle());
        Self { backend, status }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> GenerationStatus {
        self.status.borrow().clone()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> PortResult<GenerationResult> {
        self.generate_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Runs the pipeline, stopping early once `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> PortResult<GenerationResult> {
        let outcome = self.run_pipeline(request, cancel).await;
        match &outcome {
            Ok(result) => {
                info!(kind = %result.kind(), items = result.item_count(), "Generation finished.");
                self.publish(false, "Done");
            }
            Err(e) => {
                error!(kind = %request.kind(), error = %e, "Generation failed.");
                self.publish(false, e.to_string());
            }
        }
        outcome
    }

    async fn run_pipeline(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> PortResult<GenerationResult> {
        validate(request)?;

        self.publish(true, "Preparing prompt");
        let prompt = build_prompt(request);
        info!(kind = %request.kind(), prompt_chars = prompt.len(), "Prompt built.");

        self.publish(true, "Waiting for the generation backend");
        let text = self.backend.generate_text(&prompt, cancel).await?;

        self.publish(true, "Reading generated content");
        ContentDecoder::for_source(&request.source_text).decode(isolate_json(&text), request.kind())
    }

    fn publish(&self, processing: bool, message: impl Into<String>) {
        self.status.send_replace(GenerationStatus {
            processing,
            message: message.into(),
        });
    }

    //-------------------------------------------------------------------------------------
    // One operation per content kind
    //-------------------------------------------------------------------------------------

    pub async fn generate_quiz(
        &self,
        text: &str,
        question_count: usize,
        difficulty: Difficulty,
        language: &str,
    ) -> PortResult<Quiz> {
        let request = GenerationRequest::new(
            text,
            GenerationParameters::Quiz(QuizParameters {
                question_count,
                difficulty,
                language: language.to_string(),
            }),
        );
        match self.generate(&request).await? {
            GenerationResult::Quiz(quiz) => Ok(quiz),
            other => Err(unexpected_kind(&other)),
        }
    }

    pub async fn generate_flashcards(
        &self,
        text: &str,
        card_count: usize,
        categories: Vec<String>,
        language: &str,
    ) -> PortResult<FlashcardSet> {
        let request = GenerationRequest::new(
            text,
            GenerationParameters::Flashcards(FlashcardParameters {
                card_count,
                categories,
                language: language.to_string(),
            }),
        );
        match self.generate(&request).await? {
            GenerationResult::Flashcards(set) => Ok(set),
            other => Err(unexpected_kind(&other)),
        }
    }

    pub async fn generate_summary(
        &self,
        text: &str,
        length: SummaryLength,
        focus_terms: Vec<String>,
        language: &str,
        style: Option<String>,
    ) -> PortResult<TextSummary> {
        let request = GenerationRequest::new(
            text,
            GenerationParameters::Summary(SummaryParameters {
                length,
                focus_terms,
                language: language.to_string(),
                style,
            }),
        );
        match self.generate(&request).await? {
            GenerationResult::Summary(summary) => Ok(summary),
            other => Err(unexpected_kind(&other)),
        }
    }

    pub async fn generate_definitions(
        &self,
        text: &str,
        terms: Vec<String>,
        language: &str,
    ) -> PortResult<Glossary> {
        let request = GenerationRequest::new(
            text,
            GenerationParameters::Glossary(DefinitionParameters {
                terms,
                language: language.to_string(),
                max_terms: DefinitionParameters::DEFAULT_MAX_TERMS,
            }),
        );
        match self.generate(&request).await? {
            GenerationResult::Glossary(glossary) => Ok(glossary),
            other => Err(unexpected_kind(&other)),
        }
    }
}

fn validate(request: &GenerationRequest) -> PortResult<()> {
    if request.source_text.trim().is_empty() {
        return Err(GenerationError::InvalidRequest(
            "the document contains no text to generate from".to_string(),
        ));
    }
    let count = match &request.parameters {
        GenerationParameters::Quiz(p) => Some(("question count", p.question_count)),
        GenerationParameters::Flashcards(p) => Some(("card count", p.card_count)),
        GenerationParameters::Summary(_) => None,
        GenerationParameters::Glossary(p) if p.terms.is_empty() => Some(("term limit", p.max_terms)),
        GenerationParameters::Glossary(_) => None,
    };
    match count {
        Some((name, 0)) => Err(GenerationError::InvalidRequest(format!(
            "the {} must be at least 1",
            name
        ))),
        _ => Ok(()),
    }
}

fn unexpected_kind(result: &GenerationResult) -> GenerationError {
    GenerationError::DecodeFailure(format!("decoded a {} instead", result.kind()))
}
