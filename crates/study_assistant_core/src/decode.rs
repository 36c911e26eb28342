//! crates/study_assistant_core/src/decode.rs
//!
//! Decodes the isolated JSON payload into typed study content, and encodes typed
//! content back into the same wire shape.
//!
//! Top-level keys (`questions`, `flashcards`, `summary_data`, `definitions`) are
//! mandatory. Inside an array every item is decoded on its own: a malformed item
//! is logged and dropped, and only an empty outcome fails the whole decode.
//! Backend identifiers that are missing, malformed or duplicated are replaced
//! with fresh UUIDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    word_count, ContentKind, FlashCard, FlashcardSet, GenerationResult, Glossary, Importance,
    Quiz, QuizQuestion, TermDefinition, TextSummary,
};
use crate::ports::{GenerationError, PortResult};

//=========================================================================================
// The Decoder
//=========================================================================================

/// Decodes backend payloads for one source document.
#[derive(Debug, Clone, Default)]
pub struct ContentDecoder {
    source_word_count: usize,
}

impl ContentDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that falls back to the word count of `source_text` when a
    /// summary payload omits `originalWordCount`.
    pub fn for_source(source_text: &str) -> Self {
        Self {
            source_word_count: word_count(source_text),
        }
    }

    pub fn decode(&self, json: &str, kind: ContentKind) -> PortResult<GenerationResult> {
        match kind {
            ContentKind::Quiz => self.decode_quiz(json).map(GenerationResult::Quiz),
            ContentKind::Flashcards => self.decode_flashcards(json).map(GenerationResult::Flashcards),
            ContentKind::Summary => self.decode_summary(json).map(GenerationResult::Summary),
            ContentKind::Glossary => self.decode_definitions(json).map(GenerationResult::Glossary),
        }
    }

    pub fn decode_quiz(&self, json: &str) -> PortResult<Quiz> {
        let payload: QuizPayload = parse_top_level(json, "quiz")?;
        let mut ids = IdAllocator::default();

        let questions = decode_items(payload.questions, "question", |record: QuestionRecord| {
            record.into_domain(&mut ids)
        });
        if questions.is_empty() {
            return Err(GenerationError::DecodeFailure(
                "the quiz contains no usable questions".to_string(),
            ));
        }

        Ok(Quiz {
            id: ids.resolve(payload.id.as_deref()),
            title: payload
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| Quiz::DEFAULT_TITLE.to_string()),
            difficulty: payload.difficulty,
            questions,
            time_limit: payload
                .time_limit
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(Quiz::DEFAULT_TIME_LIMIT),
            passing_score: payload
                .passing_score
                .and_then(normalize_score)
                .unwrap_or(Quiz::DEFAULT_PASSING_SCORE),
            generated_at: payload.generated_at.unwrap_or_else(Utc::now),
        })
    }

    pub fn decode_flashcards(&self, json: &str) -> PortResult<FlashcardSet> {
        let payload: FlashcardPayload = parse_top_level(json, "flashcard set")?;
        let mut ids = IdAllocator::default();

        let cards = decode_items(payload.flashcards, "flashcard", |record: FlashCardRecord| {
            record.into_domain(&mut ids)
        });
        if cards.is_empty() {
            return Err(GenerationError::DecodeFailure(
                "the flashcard set contains no usable cards".to_string(),
            ));
        }

        Ok(FlashcardSet {
            id: ids.resolve(payload.id.as_deref()),
            cards,
            generated_at: payload.generated_at.unwrap_or_else(Utc::now),
        })
    }

    pub fn decode_summary(&self, json: &str) -> PortResult<TextSummary> {
        let payload: SummaryPayload = parse_top_level(json, "summary")?;
        let record: SummaryRecord = serde_json::from_value(payload.summary_data)
            .map_err(|e| GenerationError::DecodeFailure(format!("invalid summary_data: {}", e)))?;

        let summary_text = record.summary.trim().to_string();
        if summary_text.is_empty() {
            return Err(GenerationError::DecodeFailure(
                "the summary text is empty".to_string(),
            ));
        }

        let mut ids = IdAllocator::default();
        Ok(TextSummary {
            id: ids.resolve(record.id.as_deref()),
            word_count: record
                .word_count
                .map(|v| v as usize)
                .unwrap_or_else(|| word_count(&summary_text)),
            original_word_count: record
                .original_word_count
                .map(|v| v as usize)
                .unwrap_or(self.source_word_count),
            summary_text,
            key_points: record.key_points,
            main_topics: record.main_topics,
            generated_at: record.generated_at.unwrap_or_else(Utc::now),
        })
    }

    pub fn decode_definitions(&self, json: &str) -> PortResult<Glossary> {
        let payload: DefinitionsPayload = parse_top_level(json, "glossary")?;
        let mut ids = IdAllocator::default();

        let definitions = decode_items(payload.definitions, "definition", |record: DefinitionRecord| {
            record.into_domain(&mut ids)
        });
        if definitions.is_empty() {
            return Err(GenerationError::DecodeFailure(
                "the glossary contains no usable definitions".to_string(),
            ));
        }

        Ok(Glossary {
            id: ids.resolve(payload.id.as_deref()),
            definitions,
            generated_at: payload.generated_at.unwrap_or_else(Utc::now),
        })
    }
}

fn parse_top_level<T: for<'de> Deserialize<'de>>(json: &str, what: &str) -> PortResult<T> {
    serde_json::from_str(json)
        .map_err(|e| GenerationError::DecodeFailure(format!("invalid {} payload: {}", what, e)))
}

/// Decodes each array item independently, dropping the ones that fail.
fn decode_items<R, T, F>(items: Vec<Value>, what: &str, mut convert: F) -> Vec<T>
where
    R: for<'de> Deserialize<'de>,
    F: FnMut(R) -> Result<T, String>,
{
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let outcome = serde_json::from_value::<R>(item)
                .map_err(|e| e.to_string())
                .and_then(&mut convert);
            match outcome {
                Ok(value) => Some(value),
                Err(reason) => {
                    warn!(index, %reason, "Dropping malformed {} from generated content.", what);
                    None
                }
            }
        })
        .collect();
    debug!(kept = decoded.len(), total, "Decoded {} items.", what);
    decoded
}

/// Hands out identifiers that are valid and unique within one result.
#[derive(Debug, Default)]
struct IdAllocator {
    seen: HashSet<Uuid>,
}

impl IdAllocator {
    fn resolve(&mut self, supplied: Option<&str>) -> Uuid {
        let parsed = supplied
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .filter(|id| !id.is_nil() && !self.seen.contains(id));
        let id = parsed.unwrap_or_else(|| {
            if supplied.is_some() {
                debug!(?supplied, "Replacing unusable identifier from backend.");
            }
            Uuid::new_v4()
        });
        self.seen.insert(id);
        id
    }
}

/// Accepts 0..=1 fractions and 0..=100 percentages.
fn normalize_score(score: f64) -> Option<f64> {
    if (0.0..=1.0).contains(&score) {
        Some(score)
    } else if (1.0..=100.0).contains(&score) {
        Some(score / 100.0)
    } else {
        None
    }
}

fn required_text(value: String, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("field `{}` is empty", field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

//=========================================================================================
// Top-level Payloads
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizPayload {
    questions: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    difficulty: Option<String>,
    #[serde(default, alias = "time_limit", deserialize_with = "lenient_u64")]
    time_limit: Option<u64>,
    #[serde(default, alias = "passing_score", deserialize_with = "lenient_f64")]
    passing_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    generated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlashcardPayload {
    flashcards: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    generated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct SummaryPayload {
    summary_data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionsPayload {
    definitions: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    generated_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Item Records
//=========================================================================================

/// The correct answer either as the option text or as a zero-based option index.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AnswerRecord {
    Text(String),
    Index(usize),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(alias = "questionText", alias = "question_text")]
    question: String,
    options: Vec<String>,
    #[serde(alias = "correct_answer")]
    correct_answer: AnswerRecord,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl QuestionRecord {
    fn into_domain(self, ids: &mut IdAllocator) -> Result<QuizQuestion, String> {
        let question_text = required_text(self.question, "question")?;

        let mut options: Vec<String> = Vec::with_capacity(self.options.len());
        for option in self.options {
            let option = option.trim().to_string();
            if !option.is_empty() && !options.contains(&option) {
                options.push(option);
            }
        }
        if options.len() < 2 {
            return Err("a question needs at least two distinct options".to_string());
        }

        let correct_answer = match self.correct_answer {
            AnswerRecord::Text(text) => {
                let text = text.trim();
                options
                    .iter()
                    .find(|o| o.as_str() == text)
                    .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(text)))
                    .cloned()
                    .ok_or_else(|| format!("correct answer '{}' is not one of the options", text))?
            }
            AnswerRecord::Index(index) => options
                .get(index)
                .cloned()
                .ok_or_else(|| format!("correct answer index {} is out of range", index))?,
        };

        Ok(QuizQuestion {
            id: ids.resolve(self.id.as_deref()),
            question_text,
            options,
            correct_answer,
            explanation: optional_text(self.explanation),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct FlashCardRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(alias = "front")]
    term: String,
    #[serde(alias = "back")]
    definition: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    category: Option<String>,
}

impl FlashCardRecord {
    fn into_domain(self, ids: &mut IdAllocator) -> Result<FlashCard, String> {
        Ok(FlashCard {
            term: required_text(self.term, "term")?,
            definition: required_text(self.definition, "definition")?,
            id: ids.resolve(self.id.as_deref()),
            category: optional_text(self.category),
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(alias = "summaryText", alias = "summary_text")]
    summary: String,
    #[serde(default, alias = "key_points", deserialize_with = "lenient_string_list")]
    key_points: Vec<String>,
    #[serde(default, alias = "main_topics", deserialize_with = "lenient_string_list")]
    main_topics: Vec<String>,
    #[serde(default, alias = "word_count", deserialize_with = "lenient_u64")]
    word_count: Option<u64>,
    #[serde(default, alias = "original_word_count", deserialize_with = "lenient_u64")]
    original_word_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    generated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionRecord {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    term: String,
    definition: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    #[serde(default, alias = "related_terms", deserialize_with = "lenient_string_list")]
    related_terms: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    importance: Option<String>,
}

impl DefinitionRecord {
    fn into_domain(self, ids: &mut IdAllocator) -> Result<TermDefinition, String> {
        Ok(TermDefinition {
            term: required_text(self.term, "term")?,
            definition: required_text(self.definition, "definition")?,
            id: ids.resolve(self.id.as_deref()),
            context: optional_text(self.context),
            related_terms: self.related_terms,
            importance: self
                .importance
                .as_deref()
                .and_then(Importance::parse)
                .unwrap_or_default(),
        })
    }
}

//=========================================================================================
// Lenient Field Deserializers
//=========================================================================================

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

//=========================================================================================
// Encoding
//=========================================================================================

/// Encodes a result into the wire shape `ContentDecoder` reads.
pub fn encode(result: &GenerationResult) -> Value {
    match result {
        GenerationResult::Quiz(quiz) => {
            let questions: Vec<Value> = quiz
                .questions
                .iter()
                .map(|q| {
                    to_value(QuestionRecord {
                        id: Some(q.id.to_string()),
                        question: q.question_text.clone(),
                        options: q.options.clone(),
                        correct_answer: AnswerRecord::Text(q.correct_answer.clone()),
                        explanation: q.explanation.clone(),
                    })
                })
                .collect();
            json!({
                "id": quiz.id.to_string(),
                "title": quiz.title,
                "difficulty": quiz.difficulty,
                "questions": questions,
                "timeLimit": quiz.time_limit,
                "passingScore": quiz.passing_score,
                "generatedAt": quiz.generated_at.to_rfc3339(),
            })
        }
        GenerationResult::Flashcards(set) => {
            let cards: Vec<Value> = set
                .cards
                .iter()
                .map(|c| {
                    to_value(FlashCardRecord {
                        id: Some(c.id.to_string()),
                        term: c.term.clone(),
                        definition: c.definition.clone(),
                        category: c.category.clone(),
                    })
                })
                .collect();
            json!({
                "id": set.id.to_string(),
                "flashcards": cards,
                "generatedAt": set.generated_at.to_rfc3339(),
            })
        }
        GenerationResult::Summary(summary) => {
            let record = to_value(SummaryRecord {
                id: Some(summary.id.to_string()),
                summary: summary.summary_text.clone(),
                key_points: summary.key_points.clone(),
                main_topics: summary.main_topics.clone(),
                word_count: Some(summary.word_count as u64),
                original_word_count: Some(summary.original_word_count as u64),
                generated_at: Some(summary.generated_at),
            });
            json!({ "summary_data": record })
        }
        GenerationResult::Glossary(glossary) => {
            let definitions: Vec<Value> = glossary
                .definitions
                .iter()
                .map(|d| {
                    to_value(DefinitionRecord {
                        id: Some(d.id.to_string()),
                        term: d.term.clone(),
                        definition: d.definition.clone(),
                        context: d.context.clone(),
                        related_terms: d.related_terms.clone(),
                        importance: Some(d.importance.as_str().to_string()),
                    })
                })
                .collect();
            json!({
                "id": glossary.id.to_string(),
                "definitions": definitions,
                "generatedAt": glossary.generated_at.to_rfc3339(),
            })
        }
    }
}

fn to_value<T: Serialize>(record: T) -> Value {
    // Records only hold strings, numbers and lists, which always serialize.
    serde_json::to_value(record).unwrap_or(Value::Null)
}
