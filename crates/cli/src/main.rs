//! SupportDesk CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP API server
//! - `ask`      — Ask a single question or chat interactively
//! - `docs`     — List the documentation or rank it against a query
//! - `sessions` — Inspect and delete stored sessions
//! - `config`   — Show or initialize the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "supportdesk",
    about = "SupportDesk — documentation-grounded customer support chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.supportdesk/config.toml
    #[arg(short, long, global = true, env = "SUPPORTDESK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the support assistant
    Ask {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Print the reply as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// List the documentation, or rank it against a query
    Docs {
        /// Show only the documents matching this query
        #[arg(short, long)]
        query: Option<String>,

        /// How many matches to show (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List sessions, most recently active first
    List,

    /// Print the messages of a session
    Show {
        id: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a session and its messages
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask {
            message,
            session,
            stream,
        } => commands::ask::run(config_path, message, session, stream).await?,
        Commands::Docs { query, top_k } => commands::docs::run(config_path, query, top_k)?,
        Commands::Sessions { action } => match action {
            SessionAction::List => commands::sessions::list(config_path).await?,
            SessionAction::Show { id, json } => {
                commands::sessions::show(config_path, &id, json).await?
            }
            SessionAction::Delete { id } => commands::sessions::delete(config_path, &id).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force)?,
            ConfigAction::Path => commands::config_cmd::path(config_path),
        },
    }

    Ok(())
}
