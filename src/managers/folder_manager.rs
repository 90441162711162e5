//! Folder Manager for Markhub.
//!
//! CRUD operations for a user's folder forest, plus idempotent resolution
//! of folder-name paths into leaf folder ids.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

use crate::database::run_in_transaction;
use crate::types::bookmark::{Folder, PathResolution};
use crate::types::errors::FolderError;

const FOLDER_COLUMNS: &str = "id, user_id, name, parent_id, created_at, updated_at";

/// Trait defining folder management operations.
pub trait FolderManagerTrait {
    fn create_folder(&mut self, user_id: &str, name: &str, parent_id: Option<&str>) -> Result<Folder, FolderError>;
    fn get_folder(&self, user_id: &str, id: &str) -> Result<Folder, FolderError>;
    fn rename_folder(&mut self, user_id: &str, id: &str, name: &str) -> Result<Folder, FolderError>;
    /// Re-parents a folder, rejecting moves that would create a cycle.
    fn move_folder(&mut self, user_id: &str, id: &str, parent_id: Option<&str>) -> Result<Folder, FolderError>;
    fn delete_folder(&mut self, user_id: &str, id: &str) -> Result<(), FolderError>;
    fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>, FolderError>;
    /// Folders with `updated_at` strictly after `since`.
    fn list_folders_changed_since(&self, user_id: &str, since: i64) -> Result<Vec<Folder>, FolderError>;
    /// First folder of the user with exactly this name, at any depth.
    fn find_by_name(&self, user_id: &str, name: &str) -> Result<Option<Folder>, FolderError>;
    /// Returns the leaf folder of `path`, creating missing folders along the way.
    fn resolve_path(&mut self, user_id: &str, path: &[String]) -> Result<PathResolution, FolderError>;
}

/// Folder manager backed by a SQLite connection.
pub struct FolderManager<'a> {
    conn: &'a Connection,
}

impl<'a> FolderManager<'a> {
    /// Creates a new `FolderManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn row_to_folder(row: &rusqlite::Row) -> rusqlite::Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            parent_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn query_folders(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Folder>, FolderError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_folder)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn validate_name(name: &str) -> Result<(), FolderError> {
        if name.trim().is_empty() {
            return Err(FolderError::Validation("folder name is required".to_string()));
        }
        Ok(())
    }

    /// Inserts `folder` as-is, keeping its id and timestamps.
    pub fn insert(&self, folder: &Folder) -> Result<(), FolderError> {
        self.conn.execute(
            "INSERT INTO folders (id, user_id, name, parent_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                folder.id,
                folder.user_id,
                folder.name,
                folder.parent_id,
                folder.created_at,
                folder.updated_at
            ],
        )?;
        Ok(())
    }

    /// Overwrites the stored row with `folder`, keeping its timestamps.
    pub fn save_with_timestamps(&self, folder: &Folder) -> Result<(), FolderError> {
        let affected = self.conn.execute(
            "UPDATE folders SET name = ?1, parent_id = ?2, created_at = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                folder.name,
                folder.parent_id,
                folder.created_at,
                folder.updated_at,
                folder.id
            ],
        )?;

        if affected == 0 {
            return Err(FolderError::NotFound(folder.id.clone()));
        }
        Ok(())
    }

    /// Overwrites the stored row with `folder`, stamping `updated_at` with now.
    pub fn save(&self, folder: &mut Folder) -> Result<(), FolderError> {
        folder.updated_at = Self::now();
        self.save_with_timestamps(folder)
    }

    /// True when `ancestor_id` is `folder_id` itself or one of its ancestors.
    ///
    /// The walk stops at a root or at a dangling parent reference.
    pub fn is_ancestor_or_self(&self, ancestor_id: &str, folder_id: &str) -> Result<bool, FolderError> {
        let mut current = Some(folder_id.to_string());
        let mut visited = HashSet::new();
        while let Some(id) = current {
            if id == ancestor_id {
                return Ok(true);
            }
            if !visited.insert(id.clone()) {
                break;
            }
            current = self
                .conn
                .query_row(
                    "SELECT parent_id FROM folders WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?
                .flatten();
        }
        Ok(false)
    }
}

impl<'a> FolderManagerTrait for FolderManager<'a> {
    /// Creates a new folder. `parent_id` must belong to the same user.
    fn create_folder(&mut self, user_id: &str, name: &str, parent_id: Option<&str>) -> Result<Folder, FolderError> {
        Self::validate_name(name)?;
        if let Some(pid) = parent_id {
            self.get_folder(user_id, pid)?;
        }

        let now = Self::now();
        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.insert(&folder)?;
        Ok(folder)
    }

    fn get_folder(&self, user_id: &str, id: &str) -> Result<Folder, FolderError> {
        let sql = format!("SELECT {} FROM folders WHERE id = ?1", FOLDER_COLUMNS);
        let folder = self
            .conn
            .query_row(&sql, params![id], Self::row_to_folder)
            .optional()?
            .ok_or_else(|| FolderError::NotFound(id.to_string()))?;

        if folder.user_id != user_id {
            return Err(FolderError::Forbidden(id.to_string()));
        }
        Ok(folder)
    }

    fn rename_folder(&mut self, user_id: &str, id: &str, name: &str) -> Result<Folder, FolderError> {
        Self::validate_name(name)?;
        let mut folder = self.get_folder(user_id, id)?;
        folder.name = name.to_string();
        self.save(&mut folder)?;
        Ok(folder)
    }

    fn move_folder(&mut self, user_id: &str, id: &str, parent_id: Option<&str>) -> Result<Folder, FolderError> {
        let mut folder = self.get_folder(user_id, id)?;
        if let Some(pid) = parent_id {
            self.get_folder(user_id, pid)?;
            if self.is_ancestor_or_self(id, pid)? {
                return Err(FolderError::Cycle(format!(
                    "folder {} cannot be moved under its own descendant {}",
                    id, pid
                )));
            }
        }
        folder.parent_id = parent_id.map(str::to_string);
        self.save(&mut folder)?;
        Ok(folder)
    }

    /// Deletes a folder by ID.
    ///
    /// Bookmarks and child folders inside it move to root.
    fn delete_folder(&mut self, user_id: &str, id: &str) -> Result<(), FolderError> {
        self.get_folder(user_id, id)?;

        run_in_transaction(self.conn, |conn| {
            conn.execute(
                "UPDATE bookmarks SET folder_id = NULL WHERE folder_id = ?1",
                params![id],
            )?;
            conn.execute(
                "UPDATE folders SET parent_id = NULL WHERE parent_id = ?1",
                params![id],
            )?;
            let affected = conn.execute("DELETE FROM folders WHERE id = ?1", params![id])?;
            if affected == 0 {
                return Err(FolderError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }

    fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>, FolderError> {
        self.query_folders(
            &format!(
                "SELECT {} FROM folders WHERE user_id = ?1 ORDER BY created_at, rowid",
                FOLDER_COLUMNS
            ),
            &[&user_id],
        )
    }

    fn list_folders_changed_since(&self, user_id: &str, since: i64) -> Result<Vec<Folder>, FolderError> {
        self.query_folders(
            &format!(
                "SELECT {} FROM folders WHERE user_id = ?1 AND updated_at > ?2 ORDER BY created_at, rowid",
                FOLDER_COLUMNS
            ),
            &[&user_id, &since],
        )
    }

    fn find_by_name(&self, user_id: &str, name: &str) -> Result<Option<Folder>, FolderError> {
        let sql = format!(
            "SELECT {} FROM folders WHERE user_id = ?1 AND name = ?2 ORDER BY created_at, rowid LIMIT 1",
            FOLDER_COLUMNS
        );
        let folder = self
            .conn
            .query_row(&sql, params![user_id, name], Self::row_to_folder)
            .optional()?;
        Ok(folder)
    }

    /// One listing read plus at most one insert per missing segment, all in
    /// one write transaction. Sibling duplicates resolve to the first match.
    fn resolve_path(&mut self, user_id: &str, path: &[String]) -> Result<PathResolution, FolderError> {
        if let Some(pos) = path.iter().position(|name| name.trim().is_empty()) {
            return Err(FolderError::Validation(format!(
                "folder path segment {} is empty",
                pos
            )));
        }
        if path.is_empty() {
            return Ok(PathResolution { folder_id: None, created: Vec::new() });
        }

        run_in_transaction(self.conn, |conn| {
            let manager = FolderManager::new(conn);

            let mut index: HashMap<(String, Option<String>), String> = HashMap::new();
            for folder in manager.list_folders(user_id)? {
                index
                    .entry((folder.name, folder.parent_id))
                    .or_insert(folder.id);
            }

            let mut cursor: Option<String> = None;
            let mut created = Vec::new();
            for name in path {
                let key = (name.clone(), cursor.clone());
                if let Some(id) = index.get(&key) {
                    cursor = Some(id.clone());
                    continue;
                }

                let now = Self::now();
                let folder = Folder {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    name: name.clone(),
                    parent_id: cursor.clone(),
                    created_at: now,
                    updated_at: now,
                };
                manager.insert(&folder)?;
                info!(user_id, folder_id = %folder.id, name = %folder.name, "created folder for path");

                index.insert(key, folder.id.clone());
                created.push(name.clone());
                cursor = Some(folder.id);
            }

            Ok(PathResolution { folder_id: cursor, created })
        })
    }
}
