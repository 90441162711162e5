//! RPC method handler for the Markhub JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches method calls to managers and services via the
//! `App` struct. Every method except `ping` requires a `user_id` param.

use std::sync::Mutex;

use crate::app::App;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::folder_manager::{FolderManager, FolderManagerTrait};
use crate::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use crate::managers::tag_manager::{TagManager, TagManagerTrait};
use crate::services::data_clearer::{DataClearer, DataClearerTrait};
use crate::services::snapshot_exporter::{SnapshotExporter, SnapshotExporterTrait};
use crate::services::snapshot_importer::{SnapshotImporter, SnapshotImporterTrait};
use crate::types::bookmark::{BookmarkUpdate, NewBookmark};
use crate::types::settings::SettingsUpdate;
use crate::types::snapshot::parse_timestamp;

use serde_json::{json, Value};

fn str_param<'p>(params: &'p Value, key: &str) -> Result<&'p str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn opt_str_param<'p>(params: &'p Value, key: &str) -> Option<&'p str> {
    params.get(key).and_then(|v| v.as_str())
}

fn string_list_param(params: &Value, key: &str) -> Result<Vec<String>, String> {
    let arr = params
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| format!("missing {}", key))?;
    arr.iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(|| format!("{} must be an array of strings", key)))
        .collect()
}

/// `Some(None)` for an explicit null, `Some(Some(s))` for a string, `None` when absent.
fn nullable_str_param(params: &Value, key: &str) -> Result<Option<Option<String>>, String> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
        Some(_) => Err(format!("{} must be a string or null", key)),
    }
}

/// Accepts UNIX milliseconds or an RFC 3339 string.
fn since_param(params: &Value) -> Result<Option<i64>, String> {
    match params.get("since") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| "invalid since".to_string()),
        Some(Value::String(s)) => parse_timestamp(s).map(Some).ok_or_else(|| format!("invalid since: {}", s)),
        Some(_) => Err("invalid since".to_string()),
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    if method == "ping" {
        return Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")}));
    }

    let user_id = str_param(params, "user_id")?;
    let a = app.lock().map_err(|e| e.to_string())?;
    let conn = a.db.connection();

    match method {
        // ─── Settings ───
        "settings.create" => {
            let mut mgr = SettingsManager::new(conn);
            let settings = mgr.create_settings(user_id).map_err(|e| e.to_string())?;
            to_value(&settings)
        }
        "settings.get" => {
            let mgr = SettingsManager::new(conn);
            let settings = mgr.get_settings(user_id).map_err(|e| e.to_string())?;
            to_value(&settings)
        }
        "settings.update" => {
            let update: SettingsUpdate = serde_json::from_value(params.clone()).map_err(|e| e.to_string())?;
            let mut mgr = SettingsManager::new(conn);
            let (settings, cascade) = mgr.update_settings(user_id, update).map_err(|e| e.to_string())?;
            Ok(json!({"settings": to_value(&settings)?, "cascade": to_value(&cascade)?}))
        }

        // ─── Bookmarks ───
        "bookmark.create" => {
            let input: NewBookmark = serde_json::from_value(params.clone()).map_err(|e| e.to_string())?;
            let mut mgr = BookmarkManager::new(conn);
            let bookmark = mgr.create_bookmark(user_id, input).map_err(|e| e.to_string())?;
            to_value(&bookmark)
        }
        "bookmark.get" => {
            let id = str_param(params, "id")?;
            let mgr = BookmarkManager::new(conn);
            let bookmark = mgr.get_bookmark(user_id, id).map_err(|e| e.to_string())?;
            to_value(&bookmark)
        }
        "bookmark.update" => {
            let id = str_param(params, "id")?;
            let tags = match params.get("tags") {
                Some(Value::Null) | None => None,
                Some(_) => Some(string_list_param(params, "tags")?),
            };
            let update = BookmarkUpdate {
                title: opt_str_param(params, "title").map(str::to_string),
                url: opt_str_param(params, "url").map(str::to_string),
                tags,
                folder_id: nullable_str_param(params, "folder_id")?,
                favicon_url: nullable_str_param(params, "favicon_url")?,
                is_favorite: params.get("is_favorite").and_then(|v| v.as_bool()),
            };
            let mut mgr = BookmarkManager::new(conn);
            let bookmark = mgr.update_bookmark(user_id, id, update).map_err(|e| e.to_string())?;
            to_value(&bookmark)
        }
        "bookmark.move" => {
            let id = str_param(params, "id")?;
            let folder = opt_str_param(params, "folder_id");
            let mut mgr = BookmarkManager::new(conn);
            mgr.move_bookmark(user_id, id, folder).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let mut mgr = BookmarkManager::new(conn);
            mgr.delete_bookmark(user_id, id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.list" => {
            let mgr = BookmarkManager::new(conn);
            let all = params.get("all").and_then(|v| v.as_bool()).unwrap_or(false);
            let bms = if all {
                mgr.list_all_bookmarks(user_id)
            } else {
                mgr.list_bookmarks(user_id, opt_str_param(params, "folder_id"))
            }
            .map_err(|e| e.to_string())?;
            to_value(&bms)
        }
        "bookmark.search" => {
            let query = str_param(params, "query")?;
            let mgr = BookmarkManager::new(conn);
            let bms = mgr.search_bookmarks(user_id, query).map_err(|e| e.to_string())?;
            to_value(&bms)
        }

        // ─── Folders ───
        "folder.create" => {
            let name = str_param(params, "name")?;
            let parent = opt_str_param(params, "parent_id");
            let mut mgr = FolderManager::new(conn);
            let folder = mgr.create_folder(user_id, name, parent).map_err(|e| e.to_string())?;
            to_value(&folder)
        }
        "folder.list" => {
            let mgr = FolderManager::new(conn);
            let folders = mgr.list_folders(user_id).map_err(|e| e.to_string())?;
            to_value(&folders)
        }
        "folder.rename" => {
            let id = str_param(params, "id")?;
            let name = str_param(params, "name")?;
            let mut mgr = FolderManager::new(conn);
            let folder = mgr.rename_folder(user_id, id, name).map_err(|e| e.to_string())?;
            to_value(&folder)
        }
        "folder.move" => {
            let id = str_param(params, "id")?;
            let parent = opt_str_param(params, "parent_id");
            let mut mgr = FolderManager::new(conn);
            let folder = mgr.move_folder(user_id, id, parent).map_err(|e| e.to_string())?;
            to_value(&folder)
        }
        "folder.delete" => {
            let id = str_param(params, "id")?;
            let mut mgr = FolderManager::new(conn);
            mgr.delete_folder(user_id, id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "folder.ensure_path" => {
            let path = string_list_param(params, "path")?;
            let mut mgr = FolderManager::new(conn);
            let resolution = mgr.resolve_path(user_id, &path).map_err(|e| e.to_string())?;
            to_value(&resolution)
        }

        // ─── Tags ───
        "tags.add" => {
            let bookmark_id = str_param(params, "bookmark_id")?;
            let tags = str_param(params, "tags")?;
            let mgr = TagManager::new(conn);
            let bookmark = mgr.add_tags_to_bookmark(user_id, bookmark_id, tags).map_err(|e| e.to_string())?;
            to_value(&bookmark)
        }
        "tags.batch_delete" => {
            let tags = string_list_param(params, "tags")?;
            let mgr = TagManager::new(conn);
            let deleted = mgr.delete_tags(user_id, &tags).map_err(|e| e.to_string())?;
            Ok(json!({"deleted": deleted}))
        }

        // ─── Sync & backup ───
        "sync.export" => {
            let since = since_param(params)?;
            let exporter = SnapshotExporter::new(conn);
            let export = exporter.export_sync(user_id, since).map_err(|e| e.to_string())?;
            to_value(&export)
        }
        "backup.create" => {
            let dir = a.config.backup_dir_for(user_id);
            let exporter = SnapshotExporter::new(conn);
            let report = exporter
                .backup_to_store(&*a.blob_store, &dir, user_id)
                .map_err(|e| e.to_string())?;
            to_value(&report)
        }
        "backup.restore" => {
            let dir = a.config.backup_dir_for(user_id);
            let importer = SnapshotImporter::new(conn);
            let report = importer
                .restore_from_store(&*a.blob_store, &dir, user_id)
                .map_err(|e| e.to_string())?;
            to_value(&report)
        }
        "data.clear" => {
            let clearer = DataClearer::new(conn);
            let report = clearer.clear_user_data(user_id).map_err(|e| e.to_string())?;
            to_value(&report)
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
