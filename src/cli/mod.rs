//! CLI interface for qradar-mcp.

pub mod handlers;
pub mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ConfigOverrides;
use crate::init::AppContext;
use output::OutputMode;

/// qradar-mcp - IBM QRadar SIEM tools for AI agents
#[derive(Parser)]
#[command(name = "qradar-mcp", version, about, long_about = None)]
pub struct Cli {
    /// Override config directory (default: ~/.qradar-mcp)
    #[arg(long, env = "QRADAR_MCP_HOME", global = true)]
    pub config_dir: Option<PathBuf>,

    /// QRadar console host name or URL
    #[arg(long, env = "QRADAR_HOST", global = true)]
    pub host: Option<String>,

    /// Authorized service token (sent as the SEC header)
    #[arg(long, env = "QRADAR_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Verify the console's TLS certificate
    #[arg(
        long,
        env = "QRADAR_VERIFY_SSL",
        global = true,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub verify_ssl: Option<bool>,

    /// REST API version header
    #[arg(long, env = "QRADAR_API_VERSION", global = true)]
    pub api_version: Option<String>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start MCP server (stdio transport)
    Mcp,

    /// List the tool catalog
    Tools {
        /// Only tools whose name or description contains this text
        #[arg(long)]
        search: Option<String>,
        /// Print each tool's argument schema
        #[arg(long)]
        schema: bool,
    },

    /// Run one tool and print its result envelope
    Call {
        /// Tool name (e.g. qradar_get_offenses)
        tool: String,
        /// JSON object of arguments
        #[arg(long, default_value = "{}")]
        args: String,
        /// Set single argument (key=value, repeatable, value parsed as JSON when possible)
        #[arg(long, value_parser = parse_key_val, action = clap::ArgAction::Append)]
        set: Vec<(String, String)>,
    },

    /// Check connectivity and credentials against the console
    Check,

    /// Chat about your QRadar data with a local Ollama model
    Chat {
        /// Ollama model name
        #[arg(long, env = "OLLAMA_MODEL")]
        model: Option<String>,
        /// Ollama base URL
        #[arg(long, env = "OLLAMA_URL")]
        ollama_url: Option<String>,
        /// Ask one question and exit (no history)
        #[arg(long, short)]
        query: Option<String>,
        /// Print the reply as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: clap_complete::Shell,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid key=value: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

impl Cli {
    /// Connection settings given on the command line or in the environment.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            api_token: self.api_token.clone(),
            verify_ssl: self.verify_ssl,
            api_version: self.api_version.clone(),
        }
    }

    pub fn context(&self) -> anyhow::Result<AppContext> {
        AppContext::new(self.config_dir.clone(), &self.overrides())
    }
}

pub async fn execute(cli: &Cli) -> anyhow::Result<()> {
    let mode = OutputMode::from_json_flag(cli.json);

    match &cli.command {
        Commands::Mcp => anyhow::bail!("The MCP server is started from main"),

        Commands::Tools { search, schema } => {
            handlers::tools::handle_tools(search.as_deref(), *schema, mode);
        }

        Commands::Call { tool, args, set } => {
            let ctx = cli.context()?;
            handlers::call::handle_call(&ctx, tool, args, set, mode).await?;
        }

        Commands::Check => {
            let ctx = cli.context()?;
            handlers::check::handle_check(&ctx, mode).await?;
        }

        Commands::Chat {
            model,
            ollama_url,
            query,
            stream,
        } => {
            let ctx = cli.context()?;
            handlers::chat::handle_chat(
                &ctx,
                model.clone(),
                ollama_url.clone(),
                query.as_deref(),
                *stream,
                mode,
            )
            .await?;
        }

        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "qradar-mcp",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
