//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the generation pipeline.
//! These structs are independent of the backend's wire format; the JSON shapes
//! live in `decode`.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Content Kinds and Generation Parameters
//=========================================================================================

/// The four generation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Quiz,
    Flashcards,
    Summary,
    Glossary,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Quiz => "quiz",
            ContentKind::Flashcards => "flashcards",
            ContentKind::Summary => "summary",
            ContentKind::Glossary => "glossary",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiz" => Ok(ContentKind::Quiz),
            "flashcards" | "flashcard" => Ok(ContentKind::Flashcards),
            "summary" => Ok(ContentKind::Summary),
            "glossary" | "definitions" => Ok(ContentKind::Glossary),
            other => Err(format!("unknown content kind '{}'", other)),
        }
    }
}

/// Quiz difficulty. Anything outside the known levels is passed to the
/// backend verbatim as an instruction string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Mixed,
    Custom(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Mixed => "mixed",
            Difficulty::Custom(s) => s,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            "mixed" => Difficulty::Mixed,
            _ => Difficulty::Custom(s.trim().to_string()),
        })
    }
}

/// Target length of a generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLength {
    Brief,
    #[default]
    Standard,
    Detailed,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Brief => "brief",
            SummaryLength::Standard => "standard",
            SummaryLength::Detailed => "detailed",
        }
    }

    /// Inclusive word range the prompt asks the backend to stay within.
    pub fn word_range(&self) -> (usize, usize) {
        match self {
            SummaryLength::Brief => (50, 150),
            SummaryLength::Standard => (150, 300),
            SummaryLength::Detailed => (300, 600),
        }
    }
}

impl FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" | "short" => Ok(SummaryLength::Brief),
            "standard" | "medium" => Ok(SummaryLength::Standard),
            "detailed" | "long" => Ok(SummaryLength::Detailed),
            other => Err(format!("unknown summary length '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizParameters {
    pub question_count: usize,
    pub difficulty: Difficulty,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardParameters {
    pub card_count: usize,
    pub categories: Vec<String>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryParameters {
    pub length: SummaryLength,
    pub focus_terms: Vec<String>,
    pub language: String,
    /// Opaque style instruction such as "Socratic" or "analogical".
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionParameters {
    /// Terms to define. When empty the backend picks the key terms itself.
    pub terms: Vec<String>,
    pub language: String,
    /// Upper bound on backend-chosen terms; ignored when `terms` is non-empty.
    pub max_terms: usize,
}

impl DefinitionParameters {
    pub const DEFAULT_MAX_TERMS: usize = 15;
}

/// Kind-specific generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationParameters {
    Quiz(QuizParameters),
    Flashcards(FlashcardParameters),
    Summary(SummaryParameters),
    Glossary(DefinitionParameters),
}

impl GenerationParameters {
    pub fn kind(&self) -> ContentKind {
        match self {
            GenerationParameters::Quiz(_) => ContentKind::Quiz,
            GenerationParameters::Flashcards(_) => ContentKind::Flashcards,
            GenerationParameters::Summary(_) => ContentKind::Summary,
            GenerationParameters::Glossary(_) => ContentKind::Glossary,
        }
    }
}

/// A single, ephemeral request created per user action.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub source_text: String,
    pub parameters: GenerationParameters,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, parameters: GenerationParameters) -> Self {
        Self {
            source_text: source_text.into(),
            parameters,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.parameters.kind()
    }
}

//=========================================================================================
// Generated Content
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub question_text: String,
    /// Distinct answer options in presentation order.
    pub options: Vec<String>,
    /// Always one of `options`.
    pub correct_answer: String,
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub difficulty: Option<String>,
    pub questions: Vec<QuizQuestion>,
    /// Seconds allowed for the whole quiz.
    pub time_limit: u32,
    /// Fraction of correct answers needed to pass, in `0.0..=1.0`.
    pub passing_score: f64,
    pub generated_at: DateTime<Utc>,
}

impl Quiz {
    pub const DEFAULT_TIME_LIMIT: u32 = 300;
    pub const DEFAULT_PASSING_SCORE: f64 = 0.7;
    pub const DEFAULT_TITLE: &'static str = "Quiz";
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlashCard {
    pub id: Uuid,
    pub term: String,
    pub definition: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardSet {
    pub id: Uuid,
    pub cards: Vec<FlashCard>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSummary {
    pub id: Uuid,
    pub summary_text: String,
    pub key_points: Vec<String>,
    pub main_topics: Vec<String>,
    pub word_count: usize,
    pub original_word_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl TextSummary {
    /// `word_count / original_word_count`, or 0 for an empty original.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_word_count == 0 {
            0.0
        } else {
            self.word_count as f64 / self.original_word_count as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
        }
    }

    /// Lenient parse used for backend output; unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Importance::Low),
            "medium" | "moderate" => Some(Importance::Medium),
            "high" | "critical" => Some(Importance::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermDefinition {
    pub id: Uuid,
    pub term: String,
    pub definition: String,
    pub context: Option<String>,
    pub related_terms: Vec<String>,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glossary {
    pub id: Uuid,
    pub definitions: Vec<TermDefinition>,
    pub generated_at: DateTime<Utc>,
}

/// The typed outcome of one generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Quiz(Quiz),
    Flashcards(FlashcardSet),
    Summary(TextSummary),
    Glossary(Glossary),
}

impl GenerationResult {
    pub fn kind(&self) -> ContentKind {
        match self {
            GenerationResult::Quiz(_) => ContentKind::Quiz,
            GenerationResult::Flashcards(_) => ContentKind::Flashcards,
            GenerationResult::Summary(_) => ContentKind::Summary,
            GenerationResult::Glossary(_) => ContentKind::Glossary,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            GenerationResult::Quiz(q) => q.id,
            GenerationResult::Flashcards(f) => f.id,
            GenerationResult::Summary(s) => s.id,
            GenerationResult::Glossary(g) => g.id,
        }
    }

    /// Number of generated items; a summary counts as one.
    pub fn item_count(&self) -> usize {
        match self {
            GenerationResult::Quiz(q) => q.questions.len(),
            GenerationResult::Flashcards(f) => f.cards.len(),
            GenerationResult::Summary(_) => 1,
            GenerationResult::Glossary(g) => g.definitions.len(),
        }
    }
}

/// Whitespace-delimited word count, as used for summary statistics.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(word_count: usize, original_word_count: usize) -> TextSummary {
        TextSummary {
            id: Uuid::new_v4(),
            summary_text: "text".into(),
            key_points: vec![],
            main_topics: vec![],
            word_count,
            original_word_count,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn compression_ratio_divides_counts() {
        assert_eq!(summary(50, 200).compression_ratio(), 0.25);
        assert_eq!(summary(3, 7).compression_ratio(), 3.0 / 7.0);
    }

    #[test]
    fn compression_ratio_is_zero_for_empty_original() {
        assert_eq!(summary(10, 0).compression_ratio(), 0.0);
    }

    #[test]
    fn unknown_difficulty_passes_through() {
        let d: Difficulty = "Socratic".parse().unwrap();
        assert_eq!(d, Difficulty::Custom("Socratic".into()));
        assert_eq!(d.as_str(), "Socratic");
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    }

    #[test]
    fn importance_parse_is_lenient() {
        assert_eq!(Importance::parse(" High "), Some(Importance::High));
        assert_eq!(Importance::parse("moderate"), Some(Importance::Medium));
        assert_eq!(Importance::parse("urgent"), None);
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  one\ttwo\n three  "), 3);
        assert_eq!(word_count(""), 0);
    }
}
