//! Planner trait — the abstraction over the language model that plans.
//!
//! The orchestrator hands a planner a fully formatted prompt and gets text
//! back. Which protocol the text follows is the protocol adapter's concern;
//! the planner only moves bytes to and from the model.
//!
//! Implementations: Gemini `generateContent`, OpenAI-compatible chat completions.

use async_trait::async_trait;

use crate::error::PlannerError;

#[async_trait]
pub trait Planner: Send + Sync {
    /// A human-readable name for this planner (e.g., "gemini").
    fn name(&self) -> &str;

    /// The model answering, for logs.
    fn model(&self) -> &str {
        self.name()
    }

    /// Send a prompt and return the raw reply text.
    async fn generate(&self, prompt: &str) -> Result<String, PlannerError>;
}
