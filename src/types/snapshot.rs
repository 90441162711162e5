//! Snapshot and sync-export documents.
//!
//! Snapshots use absence (never an empty string) for unset optional fields.
//! Sync exports instead serialize absent parents and folders as explicit `null`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Version string written into every snapshot this crate produces.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Well-known blob name tried first on restore.
pub const DEFAULT_BACKUP_FILE: &str = "markhub_backup.json";

/// A point-in-time backup of one user's folders, bookmarks and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    #[serde(default)]
    pub folders: Vec<SnapshotFolder>,
    #[serde(default)]
    pub bookmarks: Vec<SnapshotBookmark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_settings: Option<SnapshotSettings>,
}

/// A folder as it existed in the source system. `id` and `parent_id` are
/// source identifiers, not live ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFolder {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A bookmark as it existed in the source system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBookmark {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Settings sub-document of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_list: Option<Vec<String>>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SnapshotSettings {
    /// True when the section carries at least one value worth applying.
    pub fn has_values(&self) -> bool {
        self.tag_list.is_some()
            || non_empty(&self.accent_color).is_some()
            || non_empty(&self.default_view).is_some()
            || non_empty(&self.language).is_some()
    }
}

/// Treats `Some("")` the same as `None`.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A folder in a sync export, with its materialized path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFolder {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    /// Ancestor names from root down to and including this folder.
    pub path: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A bookmark in a sync export, with the path of its containing folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub folder_id: Option<String>,
    pub folder_path: Vec<String>,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub favicon_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub total_folders: usize,
    pub total_bookmarks: usize,
    pub export_time: String,
    pub is_incremental: bool,
}

/// Full or incremental export of a user's folders and bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncExport {
    pub folders: Vec<ExportedFolder>,
    pub bookmarks: Vec<ExportedBookmark>,
    pub sync_metadata: SyncMetadata,
}

/// Result of writing a backup blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    pub file_name: String,
    pub path: String,
    pub folders: usize,
    pub bookmarks: usize,
    pub settings_included: bool,
}

/// Result of restoring a snapshot into a user's data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Blob the snapshot was read from; empty when restored from memory.
    pub source: String,
    /// Bookmarks created or updated.
    pub restored_bookmarks: usize,
    /// Folder entries present in the snapshot.
    pub restored_folders: usize,
    pub created_bookmarks: usize,
    pub updated_bookmarks: usize,
    pub created_folders: usize,
    pub skipped_folders: usize,
    pub skipped_bookmarks: usize,
    /// Folders left at root because their original parent had no live match.
    pub unlinked_folders: usize,
    pub settings_restored: bool,
}

/// Result of clearing all of a user's data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    pub cleared_bookmarks_count: usize,
    pub cleared_folders_count: usize,
    pub tags_cleared: bool,
}

/// Renders UNIX milliseconds as an RFC 3339 UTC string with millisecond precision.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::new(),
    }
}

/// Parses an RFC 3339 timestamp, or the `YYYY-MM-DD HH:MM:SS.sssZ` form,
/// into UNIX milliseconds. Sub-millisecond digits are dropped.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}
