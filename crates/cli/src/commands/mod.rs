pub mod ask;
pub mod config_cmd;
pub mod docs;
pub mod serve;
pub mod sessions;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use supportdesk_config::AppConfig;
use supportdesk_core::store::SessionStore;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, Box<dyn Error>> {
    let store = supportdesk_memory::open_store(config)
        .await
        .map_err(|e| format!("Failed to open session store: {e}"))?;
    Ok(store)
}
