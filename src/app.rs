//! App Core for Markhub.
//!
//! Holds the database, the backup blob store and the engine configuration.

use std::path::Path;

use crate::config::EngineConfig;
use crate::database::Database;
use crate::services::blob_store::{BlobStore, DirectoryBlobStore};

/// Central application struct.
///
/// Managers and services borrow `&Connection` with a lifetime, so they are
/// created on demand, e.g. `BookmarkManager::new(app.db.connection())`.
pub struct App {
    pub db: Database,
    pub blob_store: Box<dyn BlobStore + Send>,
    pub config: EngineConfig,
}

impl App {
    /// Opens the database at `config.database_path()` and a directory blob
    /// store at `config.backup_root()`, creating directories as needed.
    pub fn new(config: EngineConfig) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = Database::open(config.database_path())?;
        let blob_store = Box::new(DirectoryBlobStore::new(config.backup_root()));
        Ok(Self { db, blob_store, config })
    }

    /// Creates an App rooted at `data_dir` with otherwise default configuration.
    pub fn open(data_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = EngineConfig {
            data_dir: data_dir.to_path_buf(),
            ..EngineConfig::default()
        };
        Self::new(config)
    }

    /// Creates an App with a caller-supplied blob store.
    pub fn with_blob_store(
        db: Database,
        blob_store: Box<dyn BlobStore + Send>,
        config: EngineConfig,
    ) -> Self {
        Self { db, blob_store, config }
    }
}
