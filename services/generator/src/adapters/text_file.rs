//! services/generator/src/adapters/text_file.rs
//!
//! A `TextExtractionService` for UTF-8 plain-text documents. PDF extraction is
//! handled elsewhere.

use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use study_assistant_core::ports::{GenerationError, PortResult, TextExtractionService};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractionService for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> PortResult<String> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            return Err(GenerationError::InvalidRequest(format!(
                "{} is a PDF; extract its text first",
                path.display()
            )));
        }

        let raw = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            IoErrorKind::NotFound => {
                GenerationError::InvalidRequest(format!("{} does not exist", path.display()))
            }
            IoErrorKind::InvalidData => {
                GenerationError::InvalidRequest(format!("{} is not UTF-8 text", path.display()))
            }
            _ => GenerationError::Unexpected(format!("could not read {}: {}", path.display(), e)),
        })?;

        let text = raw.trim_start_matches('\u{feff}').trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::InvalidRequest(format!(
                "{} contains no text",
                path.display()
            )));
        }
        debug!(path = %path.display(), chars = text.len(), "Extracted document text.");
        Ok(text)
    }
}
