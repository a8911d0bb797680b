//! `cognitor query` — Single-shot or interactive query mode.

use cognitor_agent::CognitiveAgent;
use cognitor_config::{AppConfig, ProtocolKind};
use cognitor_core::AgentResponse;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>, protocol: Option<ProtocolKind>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    if let Some(protocol) = protocol {
        config.planner.protocol = protocol;
    }

    if !config.has_api_key() && config.planner.provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No planner API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    GEMINI_API_KEY=...      (default provider)");
        eprintln!("    OPENAI_API_KEY=...      (provider = \"openai\")");
        eprintln!("    COGNITOR_API_KEY=...    (any provider)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let agent = super::build_agent(&config)?;

    match message {
        Some(query) => print_response(&agent.process(&query, None).await)?,
        None => interactive(&agent, &config).await?,
    }
    Ok(())
}

async fn interactive(agent: &CognitiveAgent, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  cognitor — interactive mode");
    println!("  Planner:   {} ({})", config.planner.provider, config.planner.model);
    println!("  Protocol:  {}", agent.protocol());
    println!("  Tools:     {}", agent.registry().len());
    println!("  Type a query and press Enter; 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  Query > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        match query {
            "" => continue,
            "exit" | "quit" => break,
            _ => print_response(&agent.process(query, None).await)?,
        }
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

fn print_response(response: &AgentResponse) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
