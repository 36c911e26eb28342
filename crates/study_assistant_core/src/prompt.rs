//! crates/study_assistant_core/src/prompt.rs
//!
//! Builds the prompt sent to the generative backend for each content kind.
//! Every prompt spells out the exact JSON object the backend must return and
//! forbids any surrounding prose; parameters are interpolated verbatim.

use crate::domain::{
    DefinitionParameters, FlashcardParameters, GenerationParameters, GenerationRequest,
    QuizParameters, SummaryParameters,
};

const QUIZ_TEMPLATE: &str = r#"You are a study assistant that writes multiple-choice quizzes.

Create exactly {question_count} questions of {difficulty} difficulty about the SOURCE TEXT below.
Write every question, option and explanation in {language}.

Rules:
- Each question has between 2 and 5 distinct options.
- "correctAnswer" must be copied exactly from one of the "options".
- Add a short "explanation" telling why the correct answer is right.

Respond ONLY with a JSON object of this exact shape, with no markdown, comments or other text:
{
  "title": string,
  "questions": [
    {
      "id": string (UUID),
      "question": string,
      "options": [string],
      "correctAnswer": string,
      "explanation": string
    }
  ],
  "timeLimit": integer (seconds for the whole quiz),
  "passingScore": number (between 0 and 1)
}

SOURCE TEXT:
---
{source_text}
---"#;

const FLASHCARD_TEMPLATE: &str = r#"You are a study assistant that writes flashcards.

Create exactly {card_count} flashcards from the SOURCE TEXT below.
Write every term and definition in {language}.
{categories_instruction}

Rules:
- "term" is a short word or phrase, "definition" explains it in one or two sentences.
- Do not repeat a term.

Respond ONLY with a JSON object of this exact shape, with no markdown, comments or other text:
{
  "flashcards": [
    {
      "id": string (UUID),
      "term": string,
      "definition": string,
      "category": string
    }
  ]
}

SOURCE TEXT:
---
{source_text}
---"#;

const SUMMARY_TEMPLATE: &str = r#"You are a study assistant that summarizes documents.

Write a {length} summary of the SOURCE TEXT below, between {min_words} and {max_words} words long.
Write the summary in {language}.
{focus_instruction}
{style_instruction}

Respond ONLY with a JSON object of this exact shape, with no markdown, comments or other text:
{
  "summary_data": {
    "id": string (UUID),
    "summary": string,
    "keyPoints": [string],
    "mainTopics": [string],
    "wordCount": integer (words in "summary"),
    "originalWordCount": integer (words in the SOURCE TEXT)
  }
}

SOURCE TEXT:
---
{source_text}
---"#;

const DEFINITIONS_TEMPLATE: &str = r#"You are a study assistant that builds glossaries.

{terms_instruction}
Write every definition in {language}, using the meaning the term has in the SOURCE TEXT.

Rules:
- "context" is a short quote or paraphrase from the SOURCE TEXT where the term is used.
- "relatedTerms" lists other terms from the SOURCE TEXT that are connected to this one.
- "importance" is one of "low", "medium" or "high".

Respond ONLY with a JSON object of this exact shape, with no markdown, comments or other text:
{
  "definitions": [
    {
      "id": string (UUID),
      "term": string,
      "definition": string,
      "context": string,
      "relatedTerms": [string],
      "importance": string
    }
  ]
}

SOURCE TEXT:
---
{source_text}
---"#;

/// Builds the full prompt for a request.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let text = &request.source_text;
    match &request.parameters {
        GenerationParameters::Quiz(p) => quiz_prompt(text, p),
        GenerationParameters::Flashcards(p) => flashcard_prompt(text, p),
        GenerationParameters::Summary(p) => summary_prompt(text, p),
        GenerationParameters::Glossary(p) => definitions_prompt(text, p),
    }
}

pub fn quiz_prompt(source_text: &str, params: &QuizParameters) -> String {
    let question_count = params.question_count.to_string();
    fill(
        QUIZ_TEMPLATE,
        &[
            ("question_count", question_count.as_str()),
            ("difficulty", params.difficulty.as_str()),
            ("language", params.language.as_str()),
            ("source_text", source_text),
        ],
    )
}

pub fn flashcard_prompt(source_text: &str, params: &FlashcardParameters) -> String {
    let categories_instruction = if params.categories.is_empty() {
        "Give each card a short category of your choice.".to_string()
    } else {
        format!(
            "Assign each card one of these categories: {}.",
            params.categories.join(", ")
        )
    };

    let card_count = params.card_count.to_string();
    fill(
        FLASHCARD_TEMPLATE,
        &[
            ("card_count", card_count.as_str()),
            ("language", params.language.as_str()),
            ("categories_instruction", categories_instruction.as_str()),
            ("source_text", source_text),
        ],
    )
}

pub fn summary_prompt(source_text: &str, params: &SummaryParameters) -> String {
    let (min_words, max_words) = params.length.word_range();
    let (min_words, max_words) = (min_words.to_string(), max_words.to_string());
    let focus_instruction = if params.focus_terms.is_empty() {
        String::new()
    } else {
        format!(
            "Pay particular attention to: {}.",
            params.focus_terms.join(", ")
        )
    };
    let style_instruction = match &params.style {
        Some(style) => format!("Use this style: {}.", style),
        None => String::new(),
    };

    fill(
        SUMMARY_TEMPLATE,
        &[
            ("length", params.length.as_str()),
            ("min_words", min_words.as_str()),
            ("max_words", max_words.as_str()),
            ("language", params.language.as_str()),
            ("focus_instruction", focus_instruction.as_str()),
            ("style_instruction", style_instruction.as_str()),
            ("source_text", source_text),
        ],
    )
}

pub fn definitions_prompt(source_text: &str, params: &DefinitionParameters) -> String {
    let terms_instruction = if params.terms.is_empty() {
        format!(
            "Pick the {} most important terms in the SOURCE TEXT below and define each of them.",
            params.max_terms
        )
    } else {
        format!(
            "Define each of these terms as used in the SOURCE TEXT below: {}.",
            params.terms.join(", ")
        )
    };

    fill(
        DEFINITIONS_TEMPLATE,
        &[
            ("terms_instruction", terms_instruction.as_str()),
            ("language", params.language.as_str()),
            ("source_text", source_text),
        ],
    )
}

/// Substitutes `{name}` placeholders in one left-to-right pass. Substituted
/// values are never rescanned, and braces that do not name a known
/// placeholder (such as the JSON schema) are copied as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
