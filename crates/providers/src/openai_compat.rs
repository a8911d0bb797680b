//! OpenAI-compatible planner.
//!
//! Works with: OpenAI, OpenRouter, Ollama, DeepSeek, vLLM, and any endpoint
//! exposing `/chat/completions`. The prompt goes out as a single user message.

use async_trait::async_trait;
use cognitor_core::error::PlannerError;
use cognitor_core::Planner;
use serde::Deserialize;
use tracing::debug;

use crate::http;

pub struct OpenAiCompatPlanner {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatPlanner {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, PlannerError> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            client: http::client()?,
        })
    }

    /// OpenAI (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, PlannerError> {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Ollama (convenience constructor). No key needed.
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Result<Self, PlannerError> {
        Self::new("ollama", base_url.unwrap_or("http://localhost:11434/v1"), "ollama", model)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "stream": false,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

fn reply_text(response: ApiResponse) -> Result<String, PlannerError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PlannerError::Api {
            status_code: 200,
            message: "No choices in response".into(),
        })?;
    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl Planner for OpenAiCompatPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, PlannerError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(planner = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| PlannerError::Network(e.to_string()))?;

        let parsed: ApiResponse = http::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PlannerError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        reply_text(parsed)
    }
}
