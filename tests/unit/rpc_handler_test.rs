//! Unit tests for the RPC handler dispatch.

use std::sync::Mutex;

use markhub::app::App;
use markhub::config::EngineConfig;
use markhub::database::Database;
use markhub::rpc_handler::handle_method;
use markhub::services::blob_store::{BlobEntry, BlobStore};
use markhub::types::errors::BlobStoreError;
use serde_json::{json, Value};
use tempfile::TempDir;

fn setup() -> (Mutex<App>, TempDir) {
    let dir = TempDir::new().unwrap();
    let app = App::open(dir.path()).unwrap();
    (Mutex::new(app), dir)
}

fn call(app: &Mutex<App>, method: &str, params: Value) -> Value {
    handle_method(app, method, &params).unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

#[test]
fn test_ping() {
    let (app, _dir) = setup();
    let result = handle_method(&app, "ping", &json!({})).unwrap();
    assert_eq!(result["pong"], true);
}

#[test]
fn test_unknown_method() {
    let (app, _dir) = setup();
    let result = handle_method(&app, "nonexistent.method", &json!({"user_id": "u1"}));
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("unknown method"));
}

#[test]
fn test_missing_user_id() {
    let (app, _dir) = setup();
    let err = handle_method(&app, "folder.list", &json!({})).unwrap_err();
    assert_eq!(err, "missing user_id");
}

#[test]
fn test_bookmark_lifecycle() {
    let (app, _dir) = setup();
    call(&app, "settings.create", json!({"user_id": "u1"}));

    let folder = call(&app, "folder.ensure_path", json!({"user_id": "u1", "path": ["Work", "Reports"]}));
    assert_eq!(folder["created"], json!(["Work", "Reports"]));
    let folder_id = folder["folder_id"].as_str().unwrap().to_string();

    let bm = call(
        &app,
        "bookmark.create",
        json!({"user_id": "u1", "url": "https://a.example", "title": "A", "tags": ["x", "y"], "folder_id": folder_id}),
    );
    let bm_id = bm["id"].as_str().unwrap().to_string();

    let updated = call(
        &app,
        "bookmark.update",
        json!({"user_id": "u1", "id": bm_id, "title": "A2", "folder_id": null}),
    );
    assert_eq!(updated["title"], "A2");
    assert!(updated["folder_id"].is_null());

    let tagged = call(&app, "tags.add", json!({"user_id": "u1", "bookmark_id": bm_id, "tags": "z; x"}));
    assert_eq!(tagged["tags"], json!(["x", "y", "z"]));

    let deleted = call(&app, "tags.batch_delete", json!({"user_id": "u1", "tags": ["y"]}));
    assert_eq!(deleted["deleted"], json!(["y"]));

    let settings = call(&app, "settings.get", json!({"user_id": "u1"}));
    assert_eq!(settings["tag_list"], json!(["x", "z"]));

    let found = call(&app, "bookmark.search", json!({"user_id": "u1", "query": "a.example"}));
    assert_eq!(found.as_array().unwrap().len(), 1);

    let err = handle_method(&app, "bookmark.get", &json!({"user_id": "u2", "id": bm_id})).unwrap_err();
    assert!(err.contains("forbidden"));
}

#[test]
fn test_settings_update_reports_cascade() {
    let (app, _dir) = setup();
    call(&app, "settings.create", json!({"user_id": "u1"}));
    call(&app, "bookmark.create", json!({"user_id": "u1", "url": "https://a.example", "title": "A", "tags": ["old"]}));

    let result = call(&app, "settings.update", json!({"user_id": "u1", "tag_list": [], "dark_mode": true}));
    assert_eq!(result["cascade"]["updated"], 1);
    assert_eq!(result["settings"]["dark_mode"], true);
}

#[test]
fn test_export_backup_clear_restore() {
    let (app, _dir) = setup();
    call(&app, "settings.create", json!({"user_id": "u1"}));
    let parent = call(&app, "folder.create", json!({"user_id": "u1", "name": "Work"}));
    let child = call(
        &app,
        "folder.create",
        json!({"user_id": "u1", "name": "Reports", "parent_id": parent["id"]}),
    );
    call(
        &app,
        "bookmark.create",
        json!({"user_id": "u1", "url": "https://q3.example", "title": "Q3", "tags": ["fin"], "folder_id": child["id"]}),
    );

    let export = call(&app, "sync.export", json!({"user_id": "u1"}));
    assert_eq!(export["bookmarks"][0]["folderPath"], json!(["Work", "Reports"]));
    let incremental = call(&app, "sync.export", json!({"user_id": "u1", "since": "2999-01-01T00:00:00Z"}));
    assert_eq!(incremental["syncMetadata"]["totalBookmarks"], 0);

    let backup = call(&app, "backup.create", json!({"user_id": "u1"}));
    assert!(backup["path"].as_str().unwrap().starts_with("backups/u1/backup_"));

    let cleared = call(&app, "data.clear", json!({"user_id": "u1"}));
    assert_eq!(cleared["cleared_bookmarks_count"], 1);
    assert_eq!(cleared["cleared_folders_count"], 2);
    assert_eq!(cleared["tags_cleared"], true);

    let restored = call(&app, "backup.restore", json!({"user_id": "u1"}));
    assert_eq!(restored["restored_bookmarks"], 1);
    assert_eq!(restored["restored_folders"], 2);
    assert_eq!(restored["source"], backup["path"]);

    let export = call(&app, "sync.export", json!({"user_id": "u1"}));
    assert_eq!(export["bookmarks"][0]["folderPath"], json!(["Work", "Reports"]));
    assert_eq!(export["bookmarks"][0]["tags"], json!(["fin"]));
    let settings = call(&app, "settings.get", json!({"user_id": "u1"}));
    assert_eq!(settings["tag_list"], json!(["fin"]));
}

#[test]
fn test_restore_without_backup_fails() {
    let (app, _dir) = setup();
    let err = handle_method(&app, "backup.restore", &json!({"user_id": "u1"})).unwrap_err();
    assert!(err.contains("No backup files found"));
}

#[test]
fn test_folder_move_cycle_is_rejected() {
    let (app, _dir) = setup();
    let a = call(&app, "folder.create", json!({"user_id": "u1", "name": "A"}));
    let b = call(&app, "folder.create", json!({"user_id": "u1", "name": "B", "parent_id": a["id"]}));

    let err = handle_method(&app, "folder.move", &json!({"user_id": "u1", "id": a["id"], "parent_id": b["id"]}))
        .unwrap_err();
    assert!(err.contains("cycle"));
}

/// Blob store that is never reachable.
struct OfflineStore;

fn offline(path: &str) -> BlobStoreError {
    BlobStoreError::Io {
        path: path.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"),
    }
}

impl BlobStore for OfflineStore {
    fn write(&self, path: &str, _bytes: &[u8]) -> Result<(), BlobStoreError> {
        Err(offline(path))
    }
    fn read(&self, path: &str) -> Result<Vec<u8>, BlobStoreError> {
        Err(offline(path))
    }
    fn list(&self, dir: &str) -> Result<Vec<BlobEntry>, BlobStoreError> {
        Err(offline(dir))
    }
    fn mkdir_all(&self, path: &str) -> Result<(), BlobStoreError> {
        Err(offline(path))
    }
}

#[test]
fn test_unreachable_blob_store_fails_backup_and_restore() {
    let db = Database::open_in_memory().unwrap();
    let app = Mutex::new(App::with_blob_store(db, Box::new(OfflineStore), EngineConfig::default()));
    call(&app, "bookmark.create", json!({"user_id": "u1", "url": "https://a.example", "title": "A"}));

    let err = handle_method(&app, "backup.create", &json!({"user_id": "u1"})).unwrap_err();
    assert!(err.contains("offline"), "{}", err);

    let err = handle_method(&app, "backup.restore", &json!({"user_id": "u1"})).unwrap_err();
    assert!(err.contains("offline"), "{}", err);

    // Live data is untouched by the failed restore.
    let listed = call(&app, "bookmark.list", json!({"user_id": "u1", "all": true}));
    assert_eq!(listed.as_array().unwrap().len(), 1);
}
