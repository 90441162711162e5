//! Unit tests for EngineConfig loading and path helpers.

use std::collections::HashMap;
use std::path::PathBuf;

use markhub::config::{EngineConfig, CONFIG_FILE, ENV_BACKUP_ROOT, ENV_DATA_DIR, ENV_LOG};
use markhub::types::errors::ConfigError;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.database_file, "markhub.db");
    assert_eq!(config.backup_path, "backups");
    assert_eq!(config.log_filter, "info");
    assert_eq!(config.max_requests_per_second, 200);
    assert_eq!(config.backup_dir_for("u1"), "backups/u1");
}

#[test]
fn test_missing_file_in_data_dir_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().to_string_lossy().to_string();
    let config = EngineConfig::load_with(None, env_from(&[(ENV_DATA_DIR, &data_dir)])).unwrap();

    assert_eq!(config.data_dir, dir.path());
    assert_eq!(config.database_path(), dir.path().join("markhub.db"));
    assert_eq!(config.backup_root(), dir.path().join("blobs"));
}

#[test]
fn test_file_in_data_dir_is_read() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        r#"{"backup_path": "snapshots", "max_requests_per_second": 10}"#,
    )
    .unwrap();
    let data_dir = dir.path().to_string_lossy().to_string();

    let config = EngineConfig::load_with(None, env_from(&[(ENV_DATA_DIR, &data_dir)])).unwrap();
    assert_eq!(config.backup_path, "snapshots");
    assert_eq!(config.max_requests_per_second, 10);
    assert_eq!(config.database_file, "markhub.db");
    assert_eq!(config.backup_dir_for("u2"), "snapshots/u2");
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.json");
    std::fs::write(&path, r#"{"log_filter": "warn", "backup_root": "/srv/a"}"#).unwrap();

    let config = EngineConfig::load_with(
        Some(&path),
        env_from(&[(ENV_LOG, "markhub=debug"), (ENV_BACKUP_ROOT, "/srv/b")]),
    )
    .unwrap();
    assert_eq!(config.log_filter, "markhub=debug");
    assert_eq!(config.backup_root(), PathBuf::from("/srv/b"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = EngineConfig::load_with(Some(&path), env_from(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_missing_explicit_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load_with(Some(&dir.path().join("nope.json")), env_from(&[])).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_from_file_reports_io_error() {
    let dir = TempDir::new().unwrap();
    let err = EngineConfig::from_file(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
