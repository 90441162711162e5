//! Tag vocabulary reconciler for Markhub.
//!
//! Keeps each user's tag vocabulary (stored in their settings document) and
//! the tags on their bookmarks mutually consistent. Two execution modes:
//!
//! - best-effort: growing the vocabulary after a bookmark save, and the
//!   shrink cascade after a vocabulary edit. Failures are logged, never
//!   surfaced to the caller of the primary write.
//! - transactional: bulk tag deletion. The vocabulary write and the bookmark
//!   cascade share one transaction; a failed vocabulary write touches nothing.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::database::run_in_transaction;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{BookmarkError, TagError};
use crate::types::settings::CascadeReport;

/// Trait defining tag vocabulary operations.
pub trait TagManagerTrait {
    /// Appends the tags not yet in the vocabulary (exact match). Returns the appended tags.
    fn merge_into_vocabulary(&self, user_id: &str, tags: &[String]) -> Result<Vec<String>, TagError>;
    /// Like `merge_into_vocabulary`, but logs failures instead of returning them.
    fn sync_vocabulary(&self, user_id: &str, tags: &[String]) -> Vec<String>;
    /// Strips `removed` from every bookmark of the user, saving each individually.
    fn remove_from_bookmarks(&self, user_id: &str, removed: &[String]) -> Result<CascadeReport, TagError>;
    /// Removes the given tags from the vocabulary and all bookmarks in one transaction.
    /// Returns the tags that were actually in the vocabulary.
    fn delete_tags(&self, user_id: &str, tags: &[String]) -> Result<Vec<String>, TagError>;
    /// Merges comma/semicolon separated `input` into one bookmark's tags.
    fn add_tags_to_bookmark(&self, user_id: &str, bookmark_id: &str, input: &str) -> Result<Bookmark, TagError>;
}

/// Tag reconciler backed by a SQLite connection.
pub struct TagManager<'a> {
    conn: &'a Connection,
}

/// Splits free-text tag input on `,` or `;`, trims each token and drops empties.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let tokens: Vec<String> = input
        .split([',', ';'])
        .map(|t| t.trim().to_string())
        .collect();
    normalize_tags(&tokens)
}

/// Trims tags, drops empty ones and removes duplicates, keeping first occurrences.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

impl<'a> TagManager<'a> {
    /// Creates a new `TagManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Read-modify-write of the vocabulary inside a write transaction.
    ///
    /// With `trim_existing`, stored entries are compared trimmed so stray
    /// whitespace in old vocabulary entries does not produce near-duplicates.
    fn merge(&self, user_id: &str, tags: &[String], trim_existing: bool) -> Result<Vec<String>, TagError> {
        run_in_transaction(self.conn, |conn| {
            let settings_mgr = SettingsManager::new(conn);
            let mut settings = settings_mgr
                .find_settings(user_id)?
                .ok_or_else(|| TagError::VocabularyNotFound(user_id.to_string()))?;

            let mut added: Vec<String> = Vec::new();
            for tag in tags {
                if tag.trim().is_empty() {
                    continue;
                }
                let known = settings.tag_list.iter().any(|existing| {
                    if trim_existing {
                        existing.trim() == tag
                    } else {
                        existing == tag
                    }
                });
                if !known && !added.contains(tag) {
                    added.push(tag.clone());
                }
            }

            if !added.is_empty() {
                settings.tag_list.extend(added.iter().cloned());
                settings_mgr.save(&mut settings)?;
                debug!(user_id, added = ?added, "vocabulary grew");
            }
            Ok(added)
        })
    }

    /// Strips `removed` from each bookmark carrying any of them.
    ///
    /// A failed save is logged and counted; the rest continue.
    fn strip_tags(&self, user_id: &str, bookmarks: Vec<Bookmark>, removed: &[String]) -> CascadeReport {
        let manager = BookmarkManager::new(self.conn);
        let mut report = CascadeReport::default();

        for mut bookmark in bookmarks {
            let before = bookmark.tags.len();
            bookmark.tags.retain(|t| !removed.contains(t));
            if bookmark.tags.len() == before {
                continue;
            }
            match manager.save(&mut bookmark) {
                Ok(()) => {
                    report.updated += 1;
                    debug!(user_id, bookmark_id = %bookmark.id, tags = ?bookmark.tags, "removed deleted tags from bookmark");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(user_id, bookmark_id = %bookmark.id, error = %e, "failed to save bookmark while removing tags");
                }
            }
        }
        report
    }
}

impl<'a> TagManagerTrait for TagManager<'a> {
    fn merge_into_vocabulary(&self, user_id: &str, tags: &[String]) -> Result<Vec<String>, TagError> {
        self.merge(user_id, tags, false)
    }

    fn sync_vocabulary(&self, user_id: &str, tags: &[String]) -> Vec<String> {
        match self.merge_into_vocabulary(user_id, tags) {
            Ok(added) => added,
            Err(e) => {
                warn!(user_id, error = %e, "skipping vocabulary update");
                Vec::new()
            }
        }
    }

    fn remove_from_bookmarks(&self, user_id: &str, removed: &[String]) -> Result<CascadeReport, TagError> {
        if removed.is_empty() {
            return Ok(CascadeReport::default());
        }
        let bookmarks = BookmarkManager::new(self.conn).list_all_bookmarks(user_id)?;
        Ok(self.strip_tags(user_id, bookmarks, removed))
    }

    fn delete_tags(&self, user_id: &str, tags: &[String]) -> Result<Vec<String>, TagError> {
        let requested = normalize_tags(tags);
        if requested.is_empty() {
            return Err(TagError::Validation(
                "no valid tags provided after processing input".to_string(),
            ));
        }

        run_in_transaction(self.conn, |conn| {
            let settings_mgr = SettingsManager::new(conn);
            let mut settings = settings_mgr
                .find_settings(user_id)?
                .ok_or_else(|| TagError::VocabularyNotFound(user_id.to_string()))?;

            let (deleted, kept): (Vec<String>, Vec<String>) = settings
                .tag_list
                .iter()
                .cloned()
                .partition(|t| requested.contains(t));

            if deleted.is_empty() {
                info!(user_id, attempted = ?requested, "no requested tags were in the vocabulary");
                return Ok(deleted);
            }

            settings.tag_list = kept;
            settings_mgr.save(&mut settings)?;

            let bookmarks = BookmarkManager::new(conn).list_all_bookmarks(user_id)?;
            let report = TagManager::new(conn).strip_tags(user_id, bookmarks, &deleted);
            info!(
                user_id,
                deleted = ?deleted,
                updated = report.updated,
                failed = report.failed,
                "batch deleted tags"
            );
            Ok(deleted)
        })
    }

    fn add_tags_to_bookmark(&self, user_id: &str, bookmark_id: &str, input: &str) -> Result<Bookmark, TagError> {
        if bookmark_id.trim().is_empty() {
            return Err(TagError::Validation("bookmark id is required".to_string()));
        }
        let incoming = parse_tag_input(input);
        if incoming.is_empty() {
            return Err(TagError::Validation(
                "no valid tags provided after processing input".to_string(),
            ));
        }

        let manager = BookmarkManager::new(self.conn);
        let mut bookmark = match manager.get_bookmark(user_id, bookmark_id) {
            Ok(b) => b,
            Err(BookmarkError::NotFound(id)) => return Err(TagError::BookmarkNotFound(id)),
            Err(BookmarkError::Forbidden(id)) => return Err(TagError::Forbidden(id)),
            Err(e) => return Err(e.into()),
        };

        let mut merged = normalize_tags(&bookmark.tags);
        for tag in incoming {
            if !merged.contains(&tag) {
                merged.push(tag);
            }
        }
        bookmark.tags = merged;
        manager.save(&mut bookmark)?;

        if let Err(e) = self.merge(user_id, &bookmark.tags, true) {
            warn!(user_id, bookmark_id, error = %e, "proceeding without updating vocabulary");
        }
        Ok(bookmark)
    }
}
