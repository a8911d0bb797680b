//! The shape every query answer takes.

use serde::{Deserialize, Serialize};

/// Result of processing one top-level query. Always well formed, even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The assembled result, raw.
    pub result: String,

    pub success: bool,

    pub query: String,

    /// What to show a user.
    pub answer: String,

    /// `Query: …\nResult: …` (or `Error: …`).
    pub full_response: String,
}

impl AgentResponse {
    pub fn success(query: &str, result: impl Into<String>) -> Self {
        let result = result.into();
        Self {
            full_response: format!("Query: {query}\nResult: {result}"),
            answer: result.clone(),
            result,
            success: true,
            query: query.to_string(),
        }
    }

    pub fn failure(query: &str, error: impl std::fmt::Display) -> Self {
        Self {
            result: format!("Error: {error}"),
            success: false,
            query: query.to_string(),
            answer: format!("I encountered an error: {error}"),
            full_response: format!("Query: {query}\nError: {error}"),
        }
    }
}
