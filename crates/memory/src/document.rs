//! The persisted shape: every fact and the preference map in one JSON document.

use cognitor_core::memory::{rank, Fact, Preferences};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub facts: Vec<Fact>,

    #[serde(default)]
    pub preferences: Preferences,
}

impl MemoryDocument {
    /// Append facts not already known. Returns how many were new.
    pub fn add_facts(&mut self, facts: &[String], source: &str) -> usize {
        let mut added = 0;
        for content in facts.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
            if self.facts.iter().any(|f| f.content == content) {
                continue;
            }
            self.facts.push(Fact::new(content, source));
            added += 1;
        }
        added
    }

    pub fn recall(&self, query: &str, limit: usize, min_relevance: f64) -> Vec<Fact> {
        rank(self.facts.iter().cloned(), query, limit, min_relevance)
    }

    pub fn merge_preferences(&mut self, preferences: &Preferences) {
        for (key, value) in preferences {
            self.preferences.insert(key.clone(), value.clone());
        }
    }
}
