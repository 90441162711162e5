//! Snapshot Exporter for Markhub.
//!
//! Produces sync exports (folders and bookmarks with materialized paths) and
//! full backup snapshots written to a blob store.

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;
use tracing::{info, warn};

use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::folder_manager::{FolderManager, FolderManagerTrait};
use crate::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use crate::services::blob_store::{join_path, BlobStore};
use crate::types::bookmark::{Bookmark, Folder};
use crate::types::errors::SnapshotError;
use crate::types::snapshot::{
    format_timestamp, BackupReport, ExportedBookmark, ExportedFolder, Snapshot, SnapshotBookmark,
    SnapshotFolder, SnapshotSettings, SyncExport, SyncMetadata, SNAPSHOT_VERSION,
};

/// Trait defining export and backup operations.
pub trait SnapshotExporterTrait {
    /// Exports the user's folders and bookmarks; with `since`, only those
    /// updated strictly after it.
    fn export_sync(&self, user_id: &str, since: Option<i64>) -> Result<SyncExport, SnapshotError>;
    fn build_snapshot(&self, user_id: &str) -> Result<Snapshot, SnapshotError>;
    /// Writes a full snapshot to `<dir>/backup_<YYYYMMDD_HHMMSS_mmm>.json` without overwriting.
    fn backup_to_store(&self, store: &dyn BlobStore, dir: &str, user_id: &str) -> Result<BackupReport, SnapshotError>;
}

/// Exporter reading from a SQLite connection.
pub struct SnapshotExporter<'a> {
    conn: &'a Connection,
}

/// Ancestor names from root down to and including `folder_id`.
///
/// A dangling parent reference ends the walk, truncating the path.
pub fn materialize_path(folders: &HashMap<&str, &Folder>, folder_id: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(folder_id);
    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        let Some(folder) = folders.get(id) else {
            break;
        };
        path.push(folder.name.clone());
        current = folder.parent_id.as_deref();
    }
    path.reverse();
    path
}

impl<'a> SnapshotExporter<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn export_folder(index: &HashMap<&str, &Folder>, folder: &Folder) -> ExportedFolder {
        ExportedFolder {
            id: folder.id.clone(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.clone(),
            path: materialize_path(index, &folder.id),
            created_at: format_timestamp(folder.created_at),
            updated_at: format_timestamp(folder.updated_at),
        }
    }

    fn export_bookmark(index: &HashMap<&str, &Folder>, bookmark: &Bookmark) -> ExportedBookmark {
        let folder_path = bookmark
            .folder_id
            .as_deref()
            .map(|id| materialize_path(index, id))
            .unwrap_or_default();
        ExportedBookmark {
            id: bookmark.id.clone(),
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            folder_id: bookmark.folder_id.clone(),
            folder_path,
            tags: bookmark.tags.clone(),
            is_favorite: bookmark.is_favorite,
            favicon_url: bookmark.favicon_url.clone(),
            created_at: format_timestamp(bookmark.created_at),
            updated_at: format_timestamp(bookmark.updated_at),
        }
    }
}

/// `backup_<stamp>.json`, or with a `_<n>` suffix when that name is taken in `dir`.
fn unused_backup_name(store: &dyn BlobStore, dir: &str, stamp: &str) -> String {
    let taken: HashSet<String> = match store.list(dir) {
        Ok(entries) => entries.into_iter().map(|e| e.name).collect(),
        Err(_) => HashSet::new(),
    };
    let mut name = format!("backup_{}.json", stamp);
    let mut n = 1;
    while taken.contains(&name) {
        name = format!("backup_{}_{}.json", stamp, n);
        n += 1;
    }
    name
}

impl<'a> SnapshotExporterTrait for SnapshotExporter<'a> {
    fn export_sync(&self, user_id: &str, since: Option<i64>) -> Result<SyncExport, SnapshotError> {
        // Taken before any read; later edits land in the next incremental export.
        let export_time = chrono::Utc::now().timestamp_millis();
        let folder_mgr = FolderManager::new(self.conn);
        let bookmark_mgr = BookmarkManager::new(self.conn);

        let all_folders = folder_mgr.list_folders(user_id)?;
        let index: HashMap<&str, &Folder> = all_folders.iter().map(|f| (f.id.as_str(), f)).collect();

        let (changed_folders, bookmarks): (Option<Vec<Folder>>, Vec<Bookmark>) = match since {
            Some(ts) => (
                Some(folder_mgr.list_folders_changed_since(user_id, ts)?),
                bookmark_mgr.list_bookmarks_changed_since(user_id, ts)?,
            ),
            None => (None, bookmark_mgr.list_all_bookmarks(user_id)?),
        };

        let folders: Vec<ExportedFolder> = changed_folders
            .as_ref()
            .unwrap_or(&all_folders)
            .iter()
            .map(|f| Self::export_folder(&index, f))
            .collect();
        let bookmarks: Vec<ExportedBookmark> = bookmarks.iter().map(|b| Self::export_bookmark(&index, b)).collect();

        info!(
            user_id,
            folders = folders.len(),
            bookmarks = bookmarks.len(),
            incremental = since.is_some(),
            "exported bookmarks for sync"
        );

        Ok(SyncExport {
            sync_metadata: SyncMetadata {
                total_folders: folders.len(),
                total_bookmarks: bookmarks.len(),
                export_time: format_timestamp(export_time),
                is_incremental: since.is_some(),
            },
            folders,
            bookmarks,
        })
    }

    fn build_snapshot(&self, user_id: &str) -> Result<Snapshot, SnapshotError> {
        let folders = FolderManager::new(self.conn)
            .list_folders(user_id)?
            .into_iter()
            .map(|f| SnapshotFolder {
                id: f.id,
                parent_id: f.parent_id,
                name: f.name,
                created_at: Some(format_timestamp(f.created_at)),
                updated_at: Some(format_timestamp(f.updated_at)),
            })
            .collect();

        let bookmarks = BookmarkManager::new(self.conn)
            .list_all_bookmarks(user_id)?
            .into_iter()
            .map(|b| SnapshotBookmark {
                id: b.id,
                folder_id: b.folder_id,
                url: b.url,
                title: b.title,
                tags: b.tags,
                favicon_url: b.favicon_url,
                created_at: Some(format_timestamp(b.created_at)),
                updated_at: Some(format_timestamp(b.updated_at)),
            })
            .collect();

        let user_settings = match SettingsManager::new(self.conn).find_settings(user_id) {
            Ok(Some(s)) => Some(SnapshotSettings {
                tag_list: Some(s.tag_list),
                dark_mode: s.dark_mode,
                accent_color: s.accent_color,
                default_view: s.default_view,
                language: s.language,
            }),
            Ok(None) => {
                warn!(user_id, "no settings record, backing up without settings");
                None
            }
            Err(e) => {
                warn!(user_id, error = %e, "failed to read settings, backing up without settings");
                None
            }
        };

        Ok(Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            folders,
            bookmarks,
            user_settings,
        })
    }

    fn backup_to_store(&self, store: &dyn BlobStore, dir: &str, user_id: &str) -> Result<BackupReport, SnapshotError> {
        let snapshot = self.build_snapshot(user_id)?;
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Err(e) = store.mkdir_all(dir) {
            warn!(user_id, dir, error = %e, "could not create backup directory, attempting write anyway");
        }

        let file_name = unused_backup_name(store, dir, &chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string());
        let path = join_path(dir, &file_name);
        store.write(&path, &bytes)?;

        info!(
            user_id,
            path = %path,
            folders = snapshot.folders.len(),
            bookmarks = snapshot.bookmarks.len(),
            "backup written"
        );

        Ok(BackupReport {
            file_name,
            path,
            folders: snapshot.folders.len(),
            bookmarks: snapshot.bookmarks.len(),
            settings_included: snapshot.user_settings.is_some(),
        })
    }
}
