//! Google Gemini planner (`generateContent`).

use async_trait::async_trait;
use cognitor_core::error::PlannerError;
use cognitor_core::Planner;
use serde::Deserialize;
use tracing::debug;

use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiPlanner {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiPlanner {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, PlannerError> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            client: http::client()?,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": { "temperature": self.temperature },
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn reply_text(response: GenerateResponse) -> Result<String, PlannerError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| PlannerError::Api {
            status_code: 200,
            message: "No candidates in response".into(),
        })?;
    Ok(content.parts.into_iter().filter_map(|p| p.text).collect())
}

#[async_trait]
impl Planner for GeminiPlanner {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, PlannerError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| PlannerError::Network(e.to_string()))?;

        let parsed: GenerateResponse = http::check_status(response)
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
