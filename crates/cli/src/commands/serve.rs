//! `cognitor serve` — Start the HTTP API server.

use std::sync::Arc;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let agent = Arc::new(super::build_agent(&config)?);

    println!("cognitor gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Planner:   {} ({}, {} protocol)", config.planner.provider, config.planner.model, agent.protocol());
    println!("   Tools:     {}", agent.registry().len());

    cognitor_gateway::start(agent, &config.gateway).await?;
    Ok(())
}
