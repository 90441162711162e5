//! Snapshot Importer for Markhub.
//!
//! Merges a snapshot into a user's live data. Snapshot ids are never reused:
//! folders are matched by name, bookmarks by url, and an original-id to
//! live-id map built while restoring folders re-links parents and bookmark
//! placement. Individual entries that fail are logged and skipped.

use std::collections::HashMap;

use rusqlite::Connection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::run_in_transaction;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::folder_manager::{FolderManager, FolderManagerTrait};
use crate::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use crate::managers::tag_manager::{normalize_tags, TagManager, TagManagerTrait};
use crate::services::blob_store::{join_path, BlobEntry, BlobStore};
use crate::types::bookmark::{Bookmark, Folder};
use crate::types::errors::{BlobStoreError, BookmarkError, FolderError, SettingsError, SnapshotError, TagError};
use crate::types::snapshot::{
    non_empty, parse_timestamp, RestoreReport, Snapshot, SnapshotBookmark, SnapshotFolder, SnapshotSettings,
    DEFAULT_BACKUP_FILE, SNAPSHOT_VERSION,
};

/// Trait defining restore operations.
pub trait SnapshotImporterTrait {
    fn restore_snapshot(&self, user_id: &str, snapshot: &Snapshot) -> Result<RestoreReport, SnapshotError>;
    /// Locates, parses and restores the user's backup in `dir`.
    fn restore_from_store(&self, store: &dyn BlobStore, dir: &str, user_id: &str) -> Result<RestoreReport, SnapshotError>;
}

/// Importer writing through a SQLite connection.
pub struct SnapshotImporter<'a> {
    conn: &'a Connection,
}

/// Finds the backup blob to restore from `dir`.
///
/// `markhub_backup.json` wins when present; otherwise the most recently
/// modified `backup_*.json` file. Returns the blob path and its bytes.
pub fn locate_backup(store: &dyn BlobStore, dir: &str) -> Result<(String, Vec<u8>), SnapshotError> {
    let default_path = join_path(dir, DEFAULT_BACKUP_FILE);
    match store.read(&default_path) {
        Ok(bytes) => return Ok((default_path, bytes)),
        Err(BlobStoreError::NotFound(_)) => {
            debug!(path = %default_path, "no default backup file, looking for timestamped backups");
        }
        Err(e) => return Err(e.into()),
    }

    let entries = match store.list(dir) {
        Ok(entries) => entries,
        Err(BlobStoreError::NotFound(_)) => return Err(SnapshotError::NoBackupFound(dir.to_string())),
        Err(e) => return Err(e.into()),
    };

    let newest = entries
        .iter()
        .filter(|e| !e.is_dir && e.name.starts_with("backup_") && e.name.ends_with(".json"))
        .fold(None::<&BlobEntry>, |best, e| match best {
            Some(b) if e.mod_time <= b.mod_time => Some(b),
            _ => Some(e),
        });
    let entry = newest.ok_or_else(|| SnapshotError::NoBackupFound(dir.to_string()))?;

    let path = join_path(dir, &entry.name);
    let bytes = store.read(&path)?;
    Ok((path, bytes))
}

/// Decodes a snapshot document. `source_name` only labels errors.
pub fn parse_snapshot(source_name: &str, bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_slice(bytes).map_err(|source| SnapshotError::Parse {
        source_name: source_name.to_string(),
        source,
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        warn!(source_name, version = %snapshot.version, "restoring snapshot with unexpected version");
    }
    Ok(snapshot)
}

/// Looks up a non-empty original id in the id map.
fn mapped<'m>(ids: &'m HashMap<String, String>, original: &Option<String>) -> Option<&'m String> {
    non_empty(original).and_then(|id| ids.get(id))
}

impl<'a> SnapshotImporter<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Pass 1: match each snapshot folder by name or create it.
    fn restore_folder(&self, user_id: &str, entry: &SnapshotFolder) -> Result<(String, bool), FolderError> {
        let manager = FolderManager::new(self.conn);
        if let Some(existing) = manager.find_by_name(user_id, &entry.name)? {
            return Ok((existing.id, false));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: entry.name.clone(),
            parent_id: None,
            created_at: restored_time(&entry.created_at, now),
            updated_at: restored_time(&entry.updated_at, now),
        };
        manager.insert(&folder)?;
        Ok((folder.id, true))
    }

    /// Pass 2: re-parent a restored folder. Returns false when left unlinked.
    fn relink_folder(&self, user_id: &str, live_id: &str, parent_live_id: &str) -> Result<bool, FolderError> {
        let manager = FolderManager::new(self.conn);
        if manager.is_ancestor_or_self(live_id, parent_live_id)? {
            return Ok(false);
        }
        let mut folder = manager.get_folder(user_id, live_id)?;
        if folder.parent_id.as_deref() != Some(parent_live_id) {
            folder.parent_id = Some(parent_live_id.to_string());
            manager.save(&mut folder)?;
        }
        Ok(true)
    }

    /// Matches a snapshot bookmark by url, updating it, or creates it.
    fn restore_bookmark(
        &self,
        user_id: &str,
        entry: &SnapshotBookmark,
        folder_ids: &HashMap<String, String>,
    ) -> Result<(Bookmark, bool), BookmarkError> {
        let manager = BookmarkManager::new(self.conn);
        let incoming = normalize_tags(&entry.tags);
        let folder_id = mapped(folder_ids, &entry.folder_id).cloned();
        if folder_id.is_none() {
            if let Some(original) = non_empty(&entry.folder_id) {
                debug!(user_id, url = %entry.url, folder_id = original, "bookmark folder not restored, keeping placement");
            }
        }

        if let Some(mut bookmark) = manager.find_by_url(user_id, &entry.url)? {
            if !entry.title.is_empty() {
                bookmark.title = entry.title.clone();
            }
            if let Some(favicon) = non_empty(&entry.favicon_url) {
                bookmark.favicon_url = Some(favicon.to_string());
            }
            if folder_id.is_some() {
                bookmark.folder_id = folder_id;
            }
            let mut tags = normalize_tags(&bookmark.tags);
            for tag in incoming {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            bookmark.tags = tags;
            manager.save(&mut bookmark)?;
            return Ok((bookmark, false));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let title = if entry.title.is_empty() { entry.url.clone() } else { entry.title.clone() };
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            url: entry.url.clone(),
            tags: incoming,
            folder_id,
            favicon_url: non_empty(&entry.favicon_url).map(str::to_string),
            is_favorite: false,
            created_at: restored_time(&entry.created_at, now),
            updated_at: restored_time(&entry.updated_at, now),
        };
        manager.insert(&bookmark)?;
        Ok((bookmark, true))
    }

    /// Applies the settings section. The vocabulary only grows: it becomes
    /// the union of the live list, the snapshot list and `restored_tags`.
    fn restore_settings(
        &self,
        user_id: &str,
        section: &SnapshotSettings,
        restored_tags: &[String],
    ) -> Result<(), SettingsError> {
        run_in_transaction(self.conn, |conn| {
            let mut manager = SettingsManager::new(conn);
            let mut settings = match manager.find_settings(user_id)? {
                Some(s) => s,
                None => {
                    info!(user_id, "creating settings record during restore");
                    manager.create_settings(user_id)?
                }
            };

            let mut tag_list = normalize_tags(&settings.tag_list);
            let snapshot_tags = section.tag_list.as_deref().unwrap_or_default();
            for tag in normalize_tags(snapshot_tags).into_iter().chain(restored_tags.iter().cloned()) {
                if !tag_list.contains(&tag) {
                    tag_list.push(tag);
                }
            }
            settings.tag_list = tag_list;
            settings.dark_mode = section.dark_mode;
            if let Some(v) = non_empty(&section.accent_color) {
                settings.accent_color = Some(v.to_string());
            }
            if let Some(v) = non_empty(&section.default_view) {
                settings.default_view = Some(v.to_string());
            }
            if let Some(v) = non_empty(&section.language) {
                settings.language = Some(v.to_string());
            }
            manager.save(&mut settings)
        })
    }
}

/// Parsed snapshot time, or `fallback` when absent or unparseable.
fn restored_time(value: &Option<String>, fallback: i64) -> i64 {
    match non_empty(value) {
        Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
            debug!(value = raw, "ignoring unparseable snapshot timestamp");
            fallback
        }),
        None => fallback,
    }
}

impl<'a> SnapshotImporterTrait for SnapshotImporter<'a> {
    fn restore_snapshot(&self, user_id: &str, snapshot: &Snapshot) -> Result<RestoreReport, SnapshotError> {
        if user_id.trim().is_empty() {
            return Err(SnapshotError::Validation("user id is required".to_string()));
        }

        let mut report = RestoreReport {
            restored_folders: snapshot.folders.len(),
            ..Default::default()
        };

        let mut folder_ids: HashMap<String, String> = HashMap::new();
        for entry in &snapshot.folders {
            if entry.name.trim().is_empty() {
                warn!(user_id, folder_id = %entry.id, "skipping snapshot folder without a name");
                report.skipped_folders += 1;
                continue;
            }
            match self.restore_folder(user_id, entry) {
                Ok((live_id, created)) => {
                    if created {
                        report.created_folders += 1;
                    }
                    folder_ids.insert(entry.id.clone(), live_id);
                }
                Err(e) => {
                    warn!(user_id, folder_id = %entry.id, error = %e, "skipping snapshot folder");
                    report.skipped_folders += 1;
                }
            }
        }

        for entry in &snapshot.folders {
            let Some(original_parent) = non_empty(&entry.parent_id) else {
                continue;
            };
            let Some(live_id) = folder_ids.get(&entry.id) else {
                continue;
            };
            let Some(parent_live_id) = folder_ids.get(original_parent) else {
                warn!(user_id, folder_id = %entry.id, parent_id = original_parent, "parent not restored, leaving folder at root");
                report.unlinked_folders += 1;
                continue;
            };
            match self.relink_folder(user_id, live_id, parent_live_id) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(user_id, folder_id = %live_id, parent_id = %parent_live_id, "re-link would create a cycle, leaving folder in place");
                    report.unlinked_folders += 1;
                }
                Err(e) => {
                    warn!(user_id, folder_id = %live_id, error = %e, "failed to re-link folder");
                    report.unlinked_folders += 1;
                }
            }
        }

        let mut restored_tags: Vec<String> = Vec::new();
        for entry in &snapshot.bookmarks {
            if entry.url.trim().is_empty() {
                warn!(user_id, bookmark_id = %entry.id, "skipping snapshot bookmark without a url");
                report.skipped_bookmarks += 1;
                continue;
            }
            match self.restore_bookmark(user_id, entry, &folder_ids) {
                Ok((bookmark, created)) => {
                    if created {
                        report.created_bookmarks += 1;
                    } else {
                        report.updated_bookmarks += 1;
                    }
                    for tag in bookmark.tags {
                        if !restored_tags.contains(&tag) {
                            restored_tags.push(tag);
                        }
                    }
                }
                Err(e) => {
                    warn!(user_id, bookmark_id = %entry.id, error = %e, "skipping snapshot bookmark");
                    report.skipped_bookmarks += 1;
                }
            }
        }
        report.restored_bookmarks = report.created_bookmarks + report.updated_bookmarks;

        if !restored_tags.is_empty() {
            match TagManager::new(self.conn).merge_into_vocabulary(user_id, &restored_tags) {
                Ok(_) => {}
                Err(TagError::VocabularyNotFound(_)) => {
                    debug!(user_id, "no vocabulary yet, restored tags not recorded");
                }
                Err(e) => warn!(user_id, error = %e, "failed to merge restored tags into vocabulary"),
            }
        }

        match &snapshot.user_settings {
            Some(section) if section.has_values() => match self.restore_settings(user_id, section, &restored_tags) {
                Ok(()) => report.settings_restored = true,
                Err(e) => warn!(user_id, error = %e, "failed to restore settings"),
            },
            _ => debug!(user_id, "snapshot has no settings to restore"),
        }

        info!(
            user_id,
            folders = report.restored_folders,
            created_folders = report.created_folders,
            bookmarks = report.restored_bookmarks,
            skipped_bookmarks = report.skipped_bookmarks,
            unlinked_folders = report.unlinked_folders,
            "snapshot restored"
        );
        Ok(report)
    }

    fn restore_from_store(&self, store: &dyn BlobStore, dir: &str, user_id: &str) -> Result<RestoreReport, SnapshotError> {
        let (path, bytes) = locate_backup(store, dir)?;
        info!(user_id, path = %path, "restoring from backup");
        let snapshot = parse_snapshot(&path, &bytes)?;
        let mut report = self.restore_snapshot(user_id, &snapshot)?;
        report.source = path;
        Ok(report)
    }
}
