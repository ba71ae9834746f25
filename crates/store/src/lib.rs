//! Note store implementations for TeamKB.
//!
//! All backends implement `teamkb_core::NoteStore`. The assistant pipeline
//! only reads through `list_all_notes`; the gateway's notes routes use the
//! rest of the trait.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryNoteStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteNoteStore;

use std::sync::Arc;
use teamkb_config::StoreConfig;
use teamkb_core::{NoteStore, StoreError};
use tracing::info;

/// Open the note store selected by configuration.
pub async fn open_from_config(config: &StoreConfig) -> Result<Arc<dyn NoteStore>, StoreError> {
    match config.backend.as_str() {
        "memory" => {
            info!("Using in-memory note store; notes are lost on exit");
            Ok(Arc::new(InMemoryNoteStore::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.database_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!(
                        "Cannot create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteNoteStore::new(&url).await?))
        }
        other => Err(StoreError::Unavailable(format!(
            "Unsupported note store backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_from_config() {
        let config = StoreConfig {
            backend: "memory".into(),
            path: None,
        };
        let store = open_from_config(&config).await.unwrap();
        assert_eq!(store.name(), "in_memory");
    }

    #[tokio::test]
    async fn sqlite_backend_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.sqlite");
        let config = StoreConfig {
            backend: "sqlite".into(),
            path: Some(path.display().to_string()),
        };
        let store = open_from_config(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn unknown_backend_is_unavailable() {
        let config = StoreConfig {
            backend: "mongodb".into(),
            path: None,
        };
        assert!(matches!(
            open_from_config(&config).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
