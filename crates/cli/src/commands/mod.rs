pub mod config_cmd;
pub mod query;
pub mod serve;
pub mod tools;

use std::sync::Arc;

use cognitor_agent::CognitiveAgent;
use cognitor_config::AppConfig;
use cognitor_memory::JsonFileMemory;

/// Load `~/.cognitor/config.toml` with environment overrides applied.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Wire planner, capabilities and memory into an agent.
pub fn build_agent(config: &AppConfig) -> Result<CognitiveAgent, cognitor_core::Error> {
    let planner = cognitor_providers::build_from_config(&config.planner)?;
    let registry = Arc::new(cognitor_tools::default_registry(&config.tools)?);
    let memory = Arc::new(JsonFileMemory::open(&config.memory.path));

    Ok(CognitiveAgent::from_config(planner, registry, &config.planner, &config.agent).with_memory(memory))
}
