use std::error::Error as _;

use markhub::types::errors::*;

// === BookmarkError Tests ===

#[test]
fn bookmark_error_display_variants() {
    assert_eq!(
        BookmarkError::Validation("url is required".to_string()).to_string(),
        "Invalid bookmark input: url is required"
    );
    assert_eq!(BookmarkError::NotFound("b1".to_string()).to_string(), "Bookmark not found: b1");
    assert_eq!(
        BookmarkError::FolderNotFound("f1".to_string()).to_string(),
        "Bookmark folder not found: f1"
    );
    assert_eq!(
        BookmarkError::Forbidden("b2".to_string()).to_string(),
        "Bookmark access forbidden: b2"
    );
}

#[test]
fn bookmark_error_wraps_database_error() {
    let err: BookmarkError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(err.to_string().starts_with("Bookmark database error:"));
    assert!(err.source().is_some());
}

// === FolderError Tests ===

#[test]
fn folder_error_display_variants() {
    assert_eq!(FolderError::NotFound("f1".to_string()).to_string(), "Folder not found: f1");
    assert_eq!(FolderError::Cycle("f1 under f2".to_string()).to_string(), "Folder cycle: f1 under f2");
    assert_eq!(
        FolderError::Validation("folder name is required".to_string()).to_string(),
        "Invalid folder input: folder name is required"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::NotFound("u1".to_string()).to_string(),
        "User settings not found for user: u1"
    );
    assert_eq!(
        SettingsError::AlreadyExists("u1".to_string()).to_string(),
        "User settings already exist for user: u1"
    );
}

// === TagError Tests ===

#[test]
fn tag_error_is_transparent_over_wrapped_errors() {
    let err: TagError = SettingsError::NotFound("u1".to_string()).into();
    assert_eq!(err.to_string(), "User settings not found for user: u1");

    let err: TagError = BookmarkError::NotFound("b1".to_string()).into();
    assert_eq!(err.to_string(), "Bookmark not found: b1");
}

#[test]
fn tag_error_display_variants() {
    assert_eq!(
        TagError::VocabularyNotFound("u1".to_string()).to_string(),
        "Tag vocabulary not found for user: u1"
    );
    assert_eq!(TagError::Validation("empty".to_string()).to_string(), "Invalid tag input: empty");
}

// === BlobStoreError / SnapshotError Tests ===

#[test]
fn snapshot_error_wraps_blob_store_error() {
    let err: SnapshotError = BlobStoreError::NotFound("backups/u1/x.json".to_string()).into();
    assert_eq!(err.to_string(), "Snapshot storage error: Blob not found: backups/u1/x.json");
    assert!(err.source().is_some());
}

#[test]
fn snapshot_error_no_backup_display() {
    let err = SnapshotError::NoBackupFound("backups/u1".to_string());
    assert_eq!(err.to_string(), "No backup files found in: backups/u1");
}

#[test]
fn snapshot_parse_error_names_source() {
    let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = SnapshotError::Parse { source_name: "backups/u1/a.json".to_string(), source };
    assert!(err.to_string().starts_with("Failed to parse snapshot backups/u1/a.json:"));
}

// === ClearError Tests ===

#[test]
fn clear_error_delete_display() {
    let err = ClearError::Delete {
        collection: "bookmarks",
        id: "b2".to_string(),
        source: rusqlite::Error::QueryReturnedNoRows,
    };
    assert!(err.to_string().starts_with("Failed to delete bookmarks record b2:"));
    assert!(err.source().is_some());
}

#[test]
fn clear_error_vocabulary_keeps_source() {
    let err = ClearError::Vocabulary("u1".to_string(), SettingsError::NotFound("u1".to_string()));
    assert_eq!(err.to_string(), "Failed to clear tag list for user u1");
    assert_eq!(
        err.source().map(|s| s.to_string()),
        Some("User settings not found for user: u1".to_string())
    );
}

// === ConfigError Tests ===

#[test]
fn config_error_from_io() {
    let err: ConfigError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
    assert_eq!(err.to_string(), "Config I/O error: denied");
}
