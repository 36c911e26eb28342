//! services/generator/src/adapters/credentials.rs
//!
//! An in-process `CredentialStore`, seeded from configuration at startup.

use async_trait::async_trait;
use study_assistant_core::ports::{CredentialStore, PortResult};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    key: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            key: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_key(&self) -> PortResult<Option<String>> {
        Ok(self.key.read().await.clone())
    }

    async fn set_key(&self, key: &str) -> PortResult<()> {
        *self.key.write().await = Some(key.trim().to_string());
        Ok(())
    }

    async fn delete_key(&self) -> PortResult<()> {
        *self.key.write().await = None;
        Ok(())
    }
}
