//! JSON-document fact store.
//!
//! One document holds every fact and the preference map. It is read once
//! when the store is built and rewritten wholesale by `save`, which the
//! orchestrator calls once per processed query. A crash mid-query loses
//! that query's facts.
//!
//! Storage location: `~/.cognitor/agent_memory.json`

use async_trait::async_trait;
use cognitor_core::error::MemoryError;
use cognitor_core::memory::{Fact, FactMemory, Preferences};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::document::MemoryDocument;

pub struct JsonFileMemory {
    path: PathBuf,
    doc: Arc<RwLock<MemoryDocument>>,
}

impl JsonFileMemory {
    /// Open the document at `path`.
    ///
    /// A missing file starts empty (created on first save). A corrupted one
    /// is logged and also starts empty; it is overwritten on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            facts = doc.facts.len(),
            preferences = doc.preferences.len(),
            "Fact memory loaded"
        );
        Self {
            path,
            doc: Arc::new(RwLock::new(doc)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> MemoryDocument {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return MemoryDocument::default(),
        };
        if content.trim().is_empty() {
            return MemoryDocument::default();
        }
        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring corrupted memory file");
                MemoryDocument::default()
            }
        }
    }
}

#[async_trait]
impl FactMemory for JsonFileMemory {
    fn name(&self) -> &str {
        "json_file"
    }

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
        let content = {
            let doc = self.doc.read().await;
            serde_json::to_string_pretty(&*doc)
                .map_err(|e| MemoryError::Serialization(e.to_string()))?
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))?;
        debug!(path = %self.path.display(), "Fact memory saved");
        Ok(())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.doc.read().await.facts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn facts_and_preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory").join("agent_memory.json");

        let mem = JsonFileMemory::open(&path);
        mem.store_facts(&["x equals 20".into()], "action").await.unwrap();
        let mut prefs = Preferences::new();
        prefs.insert("precision".into(), json!(2));
        mem.merge_preferences(&prefs).await.unwrap();
        mem.save().await.unwrap();

        let reopened = JsonFileMemory::open(&path);
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(reopened.preferences().await.unwrap()["precision"], json!(2));
        let found = reopened.recall("x equals what", 5, 0.3).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "x equals 20");
        assert_eq!(found[0].source, "action");
    }

    #[tokio::test]
    async fn nothing_is_written_before_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        let mem = JsonFileMemory::open(&path);
        mem.store_facts(&["unsaved".into()], "action").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        std::fs::write(&path, "{not json").unwrap();
        let mem = JsonFileMemory::open(&path);
        assert_eq!(mem.count().await.unwrap(), 0);
        mem.store_facts(&["fresh".into()], "action").await.unwrap();
        mem.save().await.unwrap();
        assert_eq!(JsonFileMemory::open(&path).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reads_hand_written_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, r#"{"preferences": {"tone": "brief"}}"#).unwrap();
        let mem = JsonFileMemory::open(&path);
        assert_eq!(mem.path(), path.as_path());
        assert_eq!(mem.count().await.unwrap(), 0);
        assert_eq!(mem.preferences().await.unwrap()["tone"], json!("brief"));
    }
}
