//! Planner implementations for cognitor.
//!
//! All planners implement the `cognitor_core::Planner` trait.
//! `build_from_config` picks one from the `[planner]` section.

mod http;
pub mod gemini;
pub mod openai_compat;

pub use gemini::GeminiPlanner;
pub use openai_compat::OpenAiCompatPlanner;

use cognitor_config::PlannerConfig;
use cognitor_core::error::PlannerError;
use cognitor_core::Planner;
use std::sync::Arc;

/// Build the configured planner.
pub fn build_from_config(config: &PlannerConfig) -> Result<Arc<dyn Planner>, PlannerError> {
    let provider = config.provider.as_str();

    if provider == "ollama" {
        let planner = OpenAiCompatPlanner::ollama(config.api_url.as_deref(), &config.model)?
            .with_temperature(config.temperature);
        return Ok(Arc::new(planner));
    }

    let api_key = config.api_key.clone().ok_or_else(|| {
        PlannerError::NotConfigured(format!(
            "no API key for '{provider}' (set planner.api_key or COGNITOR_API_KEY)"
        ))
    })?;

    let planner: Arc<dyn Planner> = if provider == "gemini" {
        let mut p = GeminiPlanner::new(api_key, &config.model)?.with_temperature(config.temperature);
        if let Some(url) = &config.api_url {
            p = p.with_base_url(url);
        }
        Arc::new(p)
    } else {
        let base_url = match (&config.api_url, default_base_url(provider)) {
            (Some(url), _) => url.clone(),
            (None, Some(url)) => url.to_string(),
            (None, None) => {
                return Err(PlannerError::NotConfigured(format!(
                    "unknown provider '{provider}' needs planner.api_url"
                )));
            }
        };
        Arc::new(
            OpenAiCompatPlanner::new(provider, base_url, api_key, &config.model)?
                .with_temperature(config.temperature),
        )
    };

    Ok(planner)
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        _ => None,
    }
}
