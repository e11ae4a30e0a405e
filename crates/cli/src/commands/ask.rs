//! `supportdesk ask` — Single-message or interactive support chat.

use std::io::Write;
use std::path::Path;
use supportdesk_agent::SupportAssistant;
use supportdesk_config::{AppConfig, AssistantMode};
use supportdesk_core::message::SessionId;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::{load_config, open_store};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    session: Option<String>,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    // Check for API key early — give a clear error
    if config.assistant.mode == AssistantMode::Model && !config.has_api_key() {
        print_missing_key_help(config_path);
        return Err("No API key found. See above for setup instructions.".into());
    }

    let store = open_store(&config).await?;
    let assistant = SupportAssistant::from_config(&config, store)?;
    let streaming = stream || config.assistant.stream;
    let session_id = session.map(SessionId::from).unwrap_or_default();

    if let Some(msg) = message {
        // Single message mode
        answer(&assistant, &session_id, &msg, streaming, "").await?;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  SupportDesk — Interactive Mode");
    println!();
    println!("  Model:     {}", if assistant.is_offline() { "offline" } else { config.model.as_str() });
    println!("  Docs:      {} entries ({:?} policy)", assistant.docs().len(), assistant.policy());
    println!("  Session:   {session_id}");
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }
        if !line.is_empty() {
            println!();
            if let Err(e) = answer(&assistant, &session_id, line, streaming, "  Assistant > ").await {
                eprintln!("  [Error] {e}");
            }
            println!();
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Session saved as {session_id}");
    println!();

    Ok(())
}

/// Answer one message, printing the reply under `prefix`.
async fn answer(
    assistant: &SupportAssistant,
    session_id: &SessionId,
    message: &str,
    streaming: bool,
    prefix: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if streaming {
        print!("{prefix}");
        std::io::stdout().flush()?;
        let reply = assistant
            .reply_streaming(session_id, message, &mut |delta: &str| {
                print!("{delta}");
                let _ = std::io::stdout().flush();
            })
            .await?;
        println!();
        tracing::debug!(tokens_used = reply.tokens_used, sources = ?reply.sources, "Streamed reply");
    } else {
        let reply = assistant.reply(session_id, message).await?;
        for line in reply.reply.lines() {
            println!("{prefix}{line}");
        }
        tracing::debug!(tokens_used = reply.tokens_used, sources = ?reply.sources, "Reply");
    }
    Ok(())
}

fn print_missing_key_help(config_path: Option<&Path>) {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    SUPPORTDESK_API_KEY = '...'   (recommended)");
    eprintln!("    OPENAI_API_KEY      = 'sk-...'");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", super::config_file(config_path).display());
    eprintln!();
    eprintln!("  To try it without a model, set [assistant] mode = \"offline\".");
    eprintln!("  Config directory: {}", AppConfig::config_dir().display());
    eprintln!();
}
