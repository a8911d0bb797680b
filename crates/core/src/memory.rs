//! Fact memory — what the agent remembers between queries.
//!
//! Facts are short strings extracted during perception or attached to
//! successful steps. Recall is keyword overlap against the query: each
//! fact scores the share of the query's keywords it contains.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::MemoryError;

/// Caller preferences: a flat JSON object.
pub type Preferences = Map<String, Value>;

/// A single remembered fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub content: String,

    /// Where it came from (`perception`, `action`).
    pub source: String,

    pub created_at: DateTime<Utc>,

    /// Relevance score, set by `recall`.
    #[serde(skip)]
    pub score: f64,
}

impl Fact {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            source: source.into(),
            created_at: Utc::now(),
            score: 0.0,
        }
    }
}

/// Persistent fact and preference store.
///
/// Writes land in memory immediately; `save` flushes the whole document
/// once per processed query.
#[async_trait]
pub trait FactMemory: Send + Sync {
    fn name(&self) -> &str;

    /// Store facts, skipping blanks and exact duplicates. Returns how many were new.
    async fn store_facts(&self, facts: &[String], source: &str) -> Result<usize, MemoryError>;

    /// Facts relevant to `query`, best first.
    async fn recall(&self, query: &str, limit: usize, min_relevance: f64) -> Result<Vec<Fact>, MemoryError>;

    async fn preferences(&self) -> Result<Preferences, MemoryError>;

    async fn merge_preferences(&self, preferences: &Preferences) -> Result<(), MemoryError>;

    async fn save(&self) -> Result<(), MemoryError>;

    async fn count(&self) -> Result<usize, MemoryError>;
}

/// Lower-cased words longer than two characters.
pub fn keywords(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Share of the query's keywords present in `content`, in `0.0..=1.0`.
pub fn relevance(query: &str, content: &str) -> f64 {
    let wanted = keywords(query);
    if wanted.is_empty() {
        return 0.0;
    }
    let have = keywords(content);
    let hits = wanted.iter().filter(|k| have.contains(*k)).count();
    hits as f64 / wanted.len() as f64
}

/// Score, filter and rank facts for `query`: score first, newest first on ties.
pub fn rank(facts: impl IntoIterator<Item = Fact>, query: &str, limit: usize, min_relevance: f64) -> Vec<Fact> {
    let mut scored: Vec<Fact> = facts
        .into_iter()
        .map(|mut f| {
            f.score = relevance(query, &f.content);
            f
        })
        .filter(|f| f.score > 0.0 && f.score >= min_relevance)
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    scored.truncate(limit);
    scored
}
