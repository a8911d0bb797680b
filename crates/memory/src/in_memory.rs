//! In-memory fact store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use cognitor_core::error::MemoryError;
use cognitor_core::memory::{Fact, FactMemory, Preferences};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::document::MemoryDocument;

/// Keeps facts and preferences in process; `save` is a no-op.
pub struct InMemoryFacts {
    doc: Arc<RwLock<MemoryDocument>>,
}

impl InMemoryFacts {
    pub fn new() -> Self {
        Self {
            doc: Arc::new(RwLock::new(MemoryDocument::default())),
        }
    }
}

impl Default for InMemoryFacts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FactMemory for InMemoryFacts {
    fn name(&self) -> &str { "in_memory" }

    async fn store_facts(&self, facts: &[String], source: &str) -> Result<usize, MemoryError> {
        Ok(self.doc.write().await.add_facts(facts, source))
    }

    async fn recall(&self, query: &str, limit: usize, min_relevance: f64) -> Result<Vec<Fact>, MemoryError> {
        Ok(self.doc.read().await.recall(query, limit, min_relevance))
    }

    async fn preferences(&self) -> Result<Preferences, MemoryError> {
        Ok(self.doc.read().await.preferences.clone())
    }

    async fn merge_preferences(&self, preferences: &Preferences) -> Result<(), MemoryError> {
        self.doc.write().await.merge_preferences(preferences);
        Ok(())
    }

    async fn save(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.doc.read().await.facts.len())
    }
}
