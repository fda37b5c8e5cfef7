//! qradar-mcp - IBM QRadar SIEM tools for AI agents
//!
//! Usage:
//!   qradar-mcp mcp                         Start MCP server on stdio
//!   qradar-mcp tools                       List available tools
//!   qradar-mcp call <tool> --args '{..}'   Run one tool and print the envelope
//!   qradar-mcp check                       Verify connectivity to the console
//!   qradar-mcp chat                        Chat with a local Ollama model
//!   qradar-mcp --help                      Show all commands

use anyhow::Result;
use clap::Parser;

use qradar_mcp::cli::{Cli, Commands};
use qradar_mcp::config::log_filter;
use qradar_mcp::init::AppContext;
use qradar_mcp::mcp::server::run_mcp_server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr (safe for MCP stdio transport)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    match &cli.command {
        Commands::Mcp => {
            let ctx = AppContext::new(cli.config_dir.clone(), &cli.overrides())?;
            run_mcp_server(ctx).await?;
        }
        _ => qradar_mcp::cli::execute(&cli).await?,
    }

    Ok(())
}
