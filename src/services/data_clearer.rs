//! Bulk Data Clearer for Markhub.
//!
//! Deletes every folder and bookmark of a user and empties their tag
//! vocabulary as one transaction. The first failure rolls everything back.

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::database::run_in_transaction;
use crate::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use crate::types::errors::ClearError;
use crate::types::snapshot::ClearReport;

/// Trait defining the bulk clear operation.
pub trait DataClearerTrait {
    fn clear_user_data(&self, user_id: &str) -> Result<ClearReport, ClearError>;
}

/// Clearer writing through a SQLite connection.
pub struct DataClearer<'a> {
    conn: &'a Connection,
}

impl<'a> DataClearer<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn list_ids(conn: &Connection, table: &'static str, user_id: &str) -> Result<Vec<String>, ClearError> {
    let fetch_err = |source| ClearError::Fetch {
        collection: table,
        user_id: user_id.to_string(),
        source,
    };
    let sql = format!("SELECT id FROM {} WHERE user_id = ?1 ORDER BY created_at, rowid", table);
    let mut stmt = conn.prepare(&sql).map_err(fetch_err)?;
    let rows = stmt
        .query_map(params![user_id], |row| row.get::<_, String>(0))
        .map_err(fetch_err)?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row.map_err(fetch_err)?);
    }
    Ok(ids)
}

fn delete_all(conn: &Connection, table: &'static str, ids: &[String]) -> Result<usize, ClearError> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut deleted = 0;
    for id in ids {
        deleted += stmt.execute(params![id]).map_err(|source| ClearError::Delete {
            collection: table,
            id: id.clone(),
            source,
        })?;
    }
    Ok(deleted)
}

impl<'a> DataClearerTrait for DataClearer<'a> {
    fn clear_user_data(&self, user_id: &str) -> Result<ClearReport, ClearError> {
        let report = run_in_transaction(self.conn, |conn| {
            let bookmark_ids = list_ids(conn, "bookmarks", user_id)?;
            let folder_ids = list_ids(conn, "folders", user_id)?;

            let cleared_bookmarks_count = delete_all(conn, "bookmarks", &bookmark_ids)?;
            let cleared_folders_count = delete_all(conn, "folders", &folder_ids)?;

            let settings_mgr = SettingsManager::new(conn);
            let tags_cleared = match settings_mgr
                .find_settings(user_id)
                .map_err(|e| ClearError::Vocabulary(user_id.to_string(), e))?
            {
                Some(mut settings) => {
                    settings.tag_list.clear();
                    settings_mgr
                        .save(&mut settings)
                        .map_err(|e| ClearError::Vocabulary(user_id.to_string(), e))?;
                    true
                }
                None => {
                    debug!(user_id, "no settings record, nothing to clear in vocabulary");
                    false
                }
            };

            Ok::<_, ClearError>(ClearReport {
                cleared_bookmarks_count,
                cleared_folders_count,
                tags_cleared,
            })
        })?;

        info!(
            user_id,
            bookmarks = report.cleared_bookmarks_count,
            folders = report.cleared_folders_count,
            tags_cleared = report.tags_cleared,
            "cleared user data"
        );
        Ok(report)
    }
}
