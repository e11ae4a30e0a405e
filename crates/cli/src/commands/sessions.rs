//! `supportdesk sessions` — Inspect and delete stored sessions.

use std::path::Path;
use supportdesk_core::message::SessionId;

use super::{load_config, open_store};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn list(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    let sessions = store.list_sessions().await?;

    println!("Sessions ({})", sessions.len());
    println!("============");

    if sessions.is_empty() {
        println!("  No sessions yet.");
        return Ok(());
    }

    for session in &sessions {
        let count = store.messages(&session.id).await?.len();
        println!(
            "  {}  updated {}  ({} messages)",
            session.id,
            session.updated_at.format(TIME_FORMAT),
            count
        );
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>, id: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    let session_id = SessionId::from(id);

    let Some(session) = store.get_session(&session_id).await? else {
        return Err(format!("Session not found: {id}").into());
    };
    let messages = store.messages(&session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!("Session {}", session.id);
    println!("  Created: {}", session.created_at.format(TIME_FORMAT));
    println!("  Updated: {}", session.updated_at.format(TIME_FORMAT));
    println!();

    for message in &messages {
        println!("[{}] {}:", message.created_at.format(TIME_FORMAT), message.role);
        for line in message.content.lines() {
            println!("    {line}");
        }
    }

    Ok(())
}

pub async fn delete(config_path: Option<&Path>, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    if store.delete_session(&SessionId::from(id)).await? {
        println!("Deleted session {id}");
        Ok(())
    } else {
        Err(format!("Session not found: {id}").into())
    }
}
