//! `supportdesk config` — Configuration management commands.

use std::path::Path;
use supportdesk_config::AppConfig;

use super::{config_file, load_config};

pub fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn init(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_file(config_path);

    if path.exists() && !force {
        println!("Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("Created config.toml at: {}", path.display());
    println!();
    println!("Next steps:");
    println!("   1. Set SUPPORTDESK_API_KEY (or api_key in the file)");
    println!("   2. supportdesk ask --message \"How do I reset my password?\"");
    println!("   3. supportdesk serve");
    Ok(())
}

pub fn path(config_path: Option<&Path>) {
    println!("{}", config_file(config_path).display());
}
