pub mod decode;
pub mod domain;
pub mod extract;
pub mod ports;
pub mod prompt;
pub mod retry;
pub mod service;

pub use domain::{
    ContentKind, DefinitionParameters, Difficulty, FlashCard, FlashcardParameters, FlashcardSet,
    GenerationParameters, GenerationRequest, GenerationResult, Glossary, Importance, Quiz,
    QuizParameters, QuizQuestion, SummaryLength, SummaryParameters, TermDefinition, TextSummary,
};
pub use ports::{
    CredentialStore, ErrorKind, GenerationError, PortResult, ResultStore, TextExtractionService,
    TextGenerationService,
};
pub use retry::{RetryBudget, RetryDecision, RetryPolicy};
pub use service::{GenerationStatus, StudyGenerator};
