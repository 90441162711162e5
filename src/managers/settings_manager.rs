//! Settings Manager for Markhub.
//!
//! Owns the per-user settings document, which embeds the user's tag
//! vocabulary. Replacing the vocabulary cascades removed tags into the
//! user's bookmarks on a best-effort basis.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::run_in_transaction;
use crate::managers::tag_manager::{normalize_tags, TagManager, TagManagerTrait};
use crate::types::errors::SettingsError;
use crate::types::settings::{CascadeReport, SettingsUpdate, UserSettings};

const SETTINGS_COLUMNS: &str = "id, user_id, tag_list, dark_mode, accent_color, default_view, \
     language, version, created_at, updated_at";

/// Trait defining user settings operations.
pub trait SettingsManagerTrait {
    fn create_settings(&mut self, user_id: &str) -> Result<UserSettings, SettingsError>;
    fn get_settings(&self, user_id: &str) -> Result<UserSettings, SettingsError>;
    fn find_settings(&self, user_id: &str) -> Result<Option<UserSettings>, SettingsError>;
    /// Applies `update`; a replaced tag list cascades removed tags into bookmarks.
    fn update_settings(
        &mut self,
        user_id: &str,
        update: SettingsUpdate,
    ) -> Result<(UserSettings, CascadeReport), SettingsError>;
}

/// Settings manager backed by a SQLite connection.
pub struct SettingsManager<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsManager<'a> {
    /// Creates a new `SettingsManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_settings(row: &rusqlite::Row) -> rusqlite::Result<UserSettings> {
        let raw_tags: String = row.get(2)?;
        let tag_list = serde_json::from_str(&raw_tags).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(UserSettings {
            id: row.get(0)?,
            user_id: row.get(1)?,
            tag_list,
            dark_mode: row.get(3)?,
            accent_color: row.get(4)?,
            default_view: row.get(5)?,
            language: row.get(6)?,
            version: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    /// Persists every field of `settings`, bumping its version and `updated_at`.
    pub fn save(&self, settings: &mut UserSettings) -> Result<(), SettingsError> {
        let tag_list = serde_json::to_string(&settings.tag_list)?;
        let now = chrono::Utc::now().timestamp_millis();

        let affected = self.conn.execute(
            "UPDATE user_settings SET tag_list = ?1, dark_mode = ?2, accent_color = ?3, \
             default_view = ?4, language = ?5, version = version + 1, updated_at = ?6 \
             WHERE id = ?7",
            params![
                tag_list,
                settings.dark_mode,
                settings.accent_color,
                settings.default_view,
                settings.language,
                now,
                settings.id
            ],
        )?;

        if affected == 0 {
            return Err(SettingsError::NotFound(settings.user_id.clone()));
        }
        settings.version += 1;
        settings.updated_at = now;
        Ok(())
    }
}

impl<'a> SettingsManagerTrait for SettingsManager<'a> {
    /// Creates the settings document with an empty vocabulary.
    fn create_settings(&mut self, user_id: &str) -> Result<UserSettings, SettingsError> {
        if user_id.trim().is_empty() {
            return Err(SettingsError::Validation("user_id is required".to_string()));
        }
        if self.find_settings(user_id)?.is_some() {
            return Err(SettingsError::AlreadyExists(user_id.to_string()));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let settings = UserSettings {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            tag_list: Vec::new(),
            dark_mode: false,
            accent_color: None,
            default_view: None,
            language: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO user_settings (id, user_id, tag_list, dark_mode, version, created_at, updated_at) \
             VALUES (?1, ?2, '[]', 0, 1, ?3, ?4)",
            params![settings.id, settings.user_id, now, now],
        )?;

        Ok(settings)
    }

    fn get_settings(&self, user_id: &str) -> Result<UserSettings, SettingsError> {
        self.find_settings(user_id)?
            .ok_or_else(|| SettingsError::NotFound(user_id.to_string()))
    }

    fn find_settings(&self, user_id: &str) -> Result<Option<UserSettings>, SettingsError> {
        let sql = format!("SELECT {} FROM user_settings WHERE user_id = ?1", SETTINGS_COLUMNS);
        let settings = self
            .conn
            .query_row(&sql, params![user_id], Self::row_to_settings)
            .optional()?;
        Ok(settings)
    }

    /// Saves the new values first; the vocabulary-shrink cascade runs only
    /// after that save has committed and never fails the update.
    fn update_settings(
        &mut self,
        user_id: &str,
        update: SettingsUpdate,
    ) -> Result<(UserSettings, CascadeReport), SettingsError> {
        let (settings, removed) = run_in_transaction(self.conn, |conn| {
            let manager = SettingsManager::new(conn);
            let mut settings = manager.get_settings(user_id)?;

            let mut removed = Vec::new();
            if let Some(tag_list) = update.tag_list {
                let tag_list = normalize_tags(&tag_list);
                removed = settings
                    .tag_list
                    .iter()
                    .filter(|old| !tag_list.contains(old))
                    .cloned()
                    .collect::<Vec<_>>();
                settings.tag_list = tag_list;
            }
            if let Some(dark_mode) = update.dark_mode {
                settings.dark_mode = dark_mode;
            }
            if let Some(accent_color) = update.accent_color {
                settings.accent_color = Some(accent_color);
            }
            if let Some(default_view) = update.default_view {
                settings.default_view = Some(default_view);
            }
            if let Some(language) = update.language {
                settings.language = Some(language);
            }

            manager.save(&mut settings)?;
            Ok::<_, SettingsError>((settings, removed))
        })?;

        if removed.is_empty() {
            return Ok((settings, CascadeReport::default()));
        }

        info!(user_id, deleted_tags = ?removed, "vocabulary shrank, updating bookmarks");
        let report = match TagManager::new(self.conn).remove_from_bookmarks(user_id, &removed) {
            Ok(report) => report,
            Err(e) => {
                warn!(user_id, error = %e, "could not cascade removed tags into bookmarks");
                CascadeReport::default()
            }
        };
        Ok((settings, report))
    }
}
