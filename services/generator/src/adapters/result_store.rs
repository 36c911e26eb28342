//! services/generator/src/adapters/result_store.rs
//!
//! A `ResultStore` that keeps one pretty-printed JSON file per result,
//! named after the result id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use study_assistant_core::decode::{encode, ContentDecoder};
use study_assistant_core::domain::{ContentKind, GenerationResult};
use study_assistant_core::ports::{GenerationError, PortResult, ResultStore};
use tracing::info;
use uuid::Uuid;

/// On-disk record: the kind tag plus the wire-shaped content.
#[derive(Serialize, Deserialize)]
struct StoredResult {
    kind: String,
    content: Value,
}

#[derive(Debug, Clone)]
pub struct JsonFileResultStore {
    dir: PathBuf,
}

impl JsonFileResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

fn io_error(e: std::io::Error) -> GenerationError {
    GenerationError::Unexpected(format!("result store I/O failed: {}", e))
}

#[async_trait]
impl ResultStore for JsonFileResultStore {
    async fn save(&self, result: &GenerationResult) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;

        let record = StoredResult {
            kind: result.kind().to_string(),
            content: encode(result),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| GenerationError::Unexpected(e.to_string()))?;

        let path = self.path_for(result.id());
        tokio::fs::write(&path, json).await.map_err(io_error)?;
        info!(path = %path.display(), kind = %result.kind(), "Saved generated result.");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> PortResult<GenerationResult> {
        let raw = tokio::fs::read_to_string(self.path_for(id))
            .await
            .map_err(|e| match e.kind() {
                IoErrorKind::NotFound => {
                    GenerationError::InvalidRequest(format!("no saved result with id {}", id))
                }
                _ => io_error(e),
            })?;

        let record: StoredResult = serde_json::from_str(&raw)
            .map_err(|e| GenerationError::DecodeFailure(format!("corrupt saved result: {}", e)))?;
        let kind: ContentKind = record
            .kind
            .parse()
            .map_err(GenerationError::DecodeFailure)?;

        ContentDecoder::new().decode(&record.content.to_string(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use study_assistant_core::domain::{Glossary, Importance, TermDefinition};

    #[tokio::test]
    async fn saved_result_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileResultStore::new(dir.path().join("results"));

        let glossary = GenerationResult::Glossary(Glossary {
            id: Uuid::new_v4(),
            definitions: vec![TermDefinition {
                id: Uuid::new_v4(),
                term: "Osmosis".into(),
                definition: "Diffusion of water across a membrane.".into(),
                context: Some("Cells take up water by osmosis.".into()),
                related_terms: vec!["Diffusion".into()],
                importance: Importance::High,
            }],
            generated_at: Utc::now(),
        });

        store.save(&glossary).await.unwrap();
        let loaded = store.load(glossary.id()).await.unwrap();
        assert_eq!(loaded, glossary);
    }

    #[tokio::test]
    async fn unknown_id_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileResultStore::new(dir.path());
        let err = store.load(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }
}
