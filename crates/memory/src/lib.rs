//! Session store implementations for SupportDesk.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemorySessionStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionStore;

use std::sync::Arc;
use supportdesk_config::AppConfig;
use supportdesk_core::error::StoreError;
use supportdesk_core::store::SessionStore;

/// Open the store selected by `[storage]` in the configuration.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, StoreError> {
    match config.storage.backend.as_str() {
        "memory" => Ok(Arc::new(InMemorySessionStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.database_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Storage(format!("{}: {e}", parent.display())))?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteSessionStore::new(&url).await?))
        }
        other => Err(StoreError::Storage(format!(
            "unsupported storage backend '{other}'"
        ))),
    }
}
