// Markhub engine configuration
// Defaults, then an optional JSON file, then MARKHUB_* environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::services::blob_store::join_path;
use crate::types::errors::ConfigError;

pub const ENV_DATA_DIR: &str = "MARKHUB_DATA_DIR";
pub const ENV_BACKUP_ROOT: &str = "MARKHUB_BACKUP_ROOT";
pub const ENV_LOG: &str = "MARKHUB_LOG";

/// Name of the configuration file looked up inside `data_dir`.
pub const CONFIG_FILE: &str = "config.json";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the database and, by default, the backup root.
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`.
    pub database_file: String,
    /// Root directory of the blob store. Defaults to `<data_dir>/blobs`.
    pub backup_root: Option<PathBuf>,
    /// Prefix of per-user backup directories inside the blob store.
    pub backup_path: String,
    /// `tracing` filter directive, e.g. `info` or `markhub=debug`.
    pub log_filter: String,
    pub max_requests_per_second: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: "markhub.db".to_string(),
            backup_root: None,
            backup_path: "backups".to_string(),
            log_filter: "info".to_string(),
            max_requests_per_second: 200,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    ///
    /// Reads `explicit_path` if given, else `<data_dir>/config.json`. A missing
    /// file leaves the defaults in place.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit_path, |key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::load`], with a caller-supplied environment lookup.
    pub fn load_with<F>(explicit_path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_data_dir = env(ENV_DATA_DIR).filter(|v| !v.is_empty()).map(PathBuf::from);

        let candidate = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => env_data_dir
                .clone()
                .unwrap_or_else(|| Self::default().data_dir)
                .join(CONFIG_FILE),
        };
        let mut config = if candidate.exists() {
            Self::from_file(&candidate)?
        } else {
            Self::default()
        };

        if let Some(dir) = env_data_dir {
            config.data_dir = dir;
        }
        if let Some(root) = env(ENV_BACKUP_ROOT).filter(|v| !v.is_empty()) {
            config.backup_root = Some(PathBuf::from(root));
        }
        if let Some(filter) = env(ENV_LOG).filter(|v| !v.is_empty()) {
            config.log_filter = filter;
        }
        Ok(config)
    }

    /// Parses a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn backup_root(&self) -> PathBuf {
        self.backup_root
            .clone()
            .unwrap_or_else(|| self.data_dir.join("blobs"))
    }

    /// The user's backup directory inside the blob store.
    pub fn backup_dir_for(&self, user_id: &str) -> String {
        join_path(&self.backup_path, user_id)
    }
}
