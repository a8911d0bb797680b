//! cognitor CLI — the main entry point.
//!
//! Commands:
//! - `query`   — Ask a single question, or start an interactive session
//! - `serve`   — Start the HTTP gateway
//! - `tools`   — List the capabilities the planner can call
//! - `config`  — Print the default configuration

use clap::{Parser, Subcommand};
use cognitor_config::ProtocolKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "cognitor",
    about = "cognitor — an LLM-planned task agent over typed capabilities",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a query, or read queries from stdin until `exit`
    Query {
        /// Answer this query and exit instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Planner protocol: structured or legacy
        #[arg(long, env = "COGNITOR_PROTOCOL")]
        protocol: Option<ProtocolKind>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List available capabilities in planner order
    Tools,

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query { message, protocol } => commands::query::run(message, protocol).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Config => commands::config_cmd::run(),
    }

    Ok(())
}
