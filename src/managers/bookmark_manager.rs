//! Bookmark Manager for Markhub.
//!
//! Implements `BookmarkManagerTrait`: CRUD operations for a user's bookmarks,
//! backed by SQLite via `rusqlite`. Every create and update that carries tags
//! grows the user's tag vocabulary on a best-effort basis.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::managers::tag_manager::{normalize_tags, TagManager, TagManagerTrait};
use crate::types::bookmark::{Bookmark, BookmarkUpdate, NewBookmark};
use crate::types::errors::BookmarkError;

const BOOKMARK_COLUMNS: &str =
    "id, user_id, title, url, tags, folder_id, favicon_url, is_favorite, created_at, updated_at";

/// Escapes LIKE wildcards with `\`.
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Trait defining bookmark management operations.
pub trait BookmarkManagerTrait {
    fn create_bookmark(&mut self, user_id: &str, input: NewBookmark) -> Result<Bookmark, BookmarkError>;
    fn get_bookmark(&self, user_id: &str, id: &str) -> Result<Bookmark, BookmarkError>;
    fn update_bookmark(&mut self, user_id: &str, id: &str, update: BookmarkUpdate) -> Result<Bookmark, BookmarkError>;
    fn move_bookmark(&mut self, user_id: &str, id: &str, folder_id: Option<&str>) -> Result<(), BookmarkError>;
    fn delete_bookmark(&mut self, user_id: &str, id: &str) -> Result<(), BookmarkError>;
    /// Lists bookmarks in a folder, or at root when `folder_id` is `None`.
    fn list_bookmarks(&self, user_id: &str, folder_id: Option<&str>) -> Result<Vec<Bookmark>, BookmarkError>;
    fn list_all_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, BookmarkError>;
    /// Bookmarks with `updated_at` strictly after `since`.
    fn list_bookmarks_changed_since(&self, user_id: &str, since: i64) -> Result<Vec<Bookmark>, BookmarkError>;
    fn search_bookmarks(&self, user_id: &str, query: &str) -> Result<Vec<Bookmark>, BookmarkError>;
    /// First bookmark of the user with exactly this url.
    fn find_by_url(&self, user_id: &str, url: &str) -> Result<Option<Bookmark>, BookmarkError>;
}

/// Bookmark manager backed by a SQLite connection.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
}

impl<'a> BookmarkManager<'a> {
    /// Creates a new `BookmarkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let raw_tags: String = row.get(4)?;
        let tags = serde_json::from_str(&raw_tags).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Bookmark {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            tags,
            folder_id: row.get(5)?,
            favicon_url: row.get(6)?,
            is_favorite: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn query_bookmarks(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Bookmark>, BookmarkError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Checks that `folder_id` exists and belongs to `user_id`.
    fn check_folder(&self, user_id: &str, folder_id: &str) -> Result<(), BookmarkError> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM folders WHERE id = ?1",
                params![folder_id],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            None => Err(BookmarkError::FolderNotFound(folder_id.to_string())),
            Some(owner) if owner != user_id => Err(BookmarkError::Forbidden(folder_id.to_string())),
            Some(_) => Ok(()),
        }
    }

    fn require_non_empty(field: &str, value: &str) -> Result<(), BookmarkError> {
        if value.trim().is_empty() {
            return Err(BookmarkError::Validation(format!("{} is required", field)));
        }
        Ok(())
    }

    fn sync_vocabulary(&self, bookmark: &Bookmark) {
        if !bookmark.tags.is_empty() {
            TagManager::new(self.conn).sync_vocabulary(&bookmark.user_id, &bookmark.tags);
        }
    }

    /// Inserts `bookmark` as-is, keeping its id and timestamps.
    pub fn insert(&self, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        let tags = serde_json::to_string(&bookmark.tags)?;
        self.conn.execute(
            "INSERT INTO bookmarks (id, user_id, title, url, tags, folder_id, favicon_url, is_favorite, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                bookmark.id,
                bookmark.user_id,
                bookmark.title,
                bookmark.url,
                tags,
                bookmark.folder_id,
                bookmark.favicon_url,
                bookmark.is_favorite,
                bookmark.created_at,
                bookmark.updated_at
            ],
        )?;
        Ok(())
    }

    /// Overwrites the stored row with `bookmark`, stamping `updated_at` with now.
    pub fn save(&self, bookmark: &mut Bookmark) -> Result<(), BookmarkError> {
        bookmark.updated_at = Self::now();
        self.save_with_timestamps(bookmark)
    }

    /// Overwrites the stored row with `bookmark`, keeping its timestamps.
    pub fn save_with_timestamps(&self, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        let tags = serde_json::to_string(&bookmark.tags)?;
        let affected = self.conn.execute(
            "UPDATE bookmarks SET title = ?1, url = ?2, tags = ?3, folder_id = ?4, favicon_url = ?5, \
             is_favorite = ?6, created_at = ?7, updated_at = ?8 WHERE id = ?9",
            params![
                bookmark.title,
                bookmark.url,
                tags,
                bookmark.folder_id,
                bookmark.favicon_url,
                bookmark.is_favorite,
                bookmark.created_at,
                bookmark.updated_at,
                bookmark.id
            ],
        )?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(bookmark.id.clone()));
        }
        Ok(())
    }
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    /// Adds a new bookmark and grows the vocabulary with its tags.
    fn create_bookmark(&mut self, user_id: &str, input: NewBookmark) -> Result<Bookmark, BookmarkError> {
        Self::require_non_empty("user_id", user_id)?;
        Self::require_non_empty("url", &input.url)?;
        Self::require_non_empty("title", &input.title)?;

        // Validate folder exists if specified
        if let Some(fid) = input.folder_id.as_deref() {
            self.check_folder(user_id, fid)?;
        }

        let now = Self::now();
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: input.title,
            url: input.url,
            tags: normalize_tags(&input.tags),
            folder_id: input.folder_id,
            favicon_url: input.favicon_url.filter(|f| !f.is_empty()),
            is_favorite: input.is_favorite,
            created_at: now,
            updated_at: now,
        };
        self.insert(&bookmark)?;
        self.sync_vocabulary(&bookmark);

        Ok(bookmark)
    }

    fn get_bookmark(&self, user_id: &str, id: &str) -> Result<Bookmark, BookmarkError> {
        let sql = format!("SELECT {} FROM bookmarks WHERE id = ?1", BOOKMARK_COLUMNS);
        let bookmark = self
            .conn
            .query_row(&sql, params![id], Self::row_to_bookmark)
            .optional()?
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;

        if bookmark.user_id != user_id {
            return Err(BookmarkError::Forbidden(id.to_string()));
        }
        Ok(bookmark)
    }

    /// Applies a partial update and grows the vocabulary with the saved tags.
    fn update_bookmark(&mut self, user_id: &str, id: &str, update: BookmarkUpdate) -> Result<Bookmark, BookmarkError> {
        let mut bookmark = self.get_bookmark(user_id, id)?;

        if let Some(title) = update.title {
            Self::require_non_empty("title", &title)?;
            bookmark.title = title;
        }
        if let Some(url) = update.url {
            Self::require_non_empty("url", &url)?;
            bookmark.url = url;
        }
        if let Some(tags) = update.tags {
            bookmark.tags = normalize_tags(&tags);
        }
        if let Some(folder_id) = update.folder_id {
            if let Some(fid) = folder_id.as_deref() {
                self.check_folder(user_id, fid)?;
            }
            bookmark.folder_id = folder_id;
        }
        if let Some(favicon_url) = update.favicon_url {
            bookmark.favicon_url = favicon_url.filter(|f| !f.is_empty());
        }
        if let Some(is_favorite) = update.is_favorite {
            bookmark.is_favorite = is_favorite;
        }

        self.save(&mut bookmark)?;
        self.sync_vocabulary(&bookmark);
        Ok(bookmark)
    }

    /// Moves a bookmark to a different folder (or to root if `folder_id` is `None`).
    fn move_bookmark(&mut self, user_id: &str, id: &str, folder_id: Option<&str>) -> Result<(), BookmarkError> {
        let mut bookmark = self.get_bookmark(user_id, id)?;
        if let Some(fid) = folder_id {
            self.check_folder(user_id, fid)?;
        }
        bookmark.folder_id = folder_id.map(str::to_string);
        self.save(&mut bookmark)
    }

    /// Removes a bookmark by ID. Its tags stay in the vocabulary.
    fn delete_bookmark(&mut self, user_id: &str, id: &str) -> Result<(), BookmarkError> {
        self.get_bookmark(user_id, id)?;
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_bookmarks(&self, user_id: &str, folder_id: Option<&str>) -> Result<Vec<Bookmark>, BookmarkError> {
        match folder_id {
            Some(fid) => self.query_bookmarks(
                &format!(
                    "SELECT {} FROM bookmarks WHERE user_id = ?1 AND folder_id = ?2 ORDER BY created_at, rowid",
                    BOOKMARK_COLUMNS
                ),
                &[&user_id, &fid],
            ),
            None => self.query_bookmarks(
                &format!(
                    "SELECT {} FROM bookmarks WHERE user_id = ?1 AND folder_id IS NULL ORDER BY created_at, rowid",
                    BOOKMARK_COLUMNS
                ),
                &[&user_id],
            ),
        }
    }

    fn list_all_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, BookmarkError> {
        self.query_bookmarks(
            &format!(
                "SELECT {} FROM bookmarks WHERE user_id = ?1 ORDER BY created_at, rowid",
                BOOKMARK_COLUMNS
            ),
            &[&user_id],
        )
    }

    fn list_bookmarks_changed_since(&self, user_id: &str, since: i64) -> Result<Vec<Bookmark>, BookmarkError> {
        self.query_bookmarks(
            &format!(
                "SELECT {} FROM bookmarks WHERE user_id = ?1 AND updated_at > ?2 ORDER BY created_at, rowid",
                BOOKMARK_COLUMNS
            ),
            &[&user_id, &since],
        )
    }

    /// Searches the user's bookmarks by title or URL using SQL LIKE.
    /// `%` and `_` in the query match literally.
    fn search_bookmarks(&self, user_id: &str, query: &str) -> Result<Vec<Bookmark>, BookmarkError> {
        let pattern = format!("%{}%", escape_like(query));
        self.query_bookmarks(
            &format!(
                "SELECT {} FROM bookmarks WHERE user_id = ?1 \
                 AND (title LIKE ?2 ESCAPE '\\' OR url LIKE ?2 ESCAPE '\\') \
                 ORDER BY created_at, rowid",
                BOOKMARK_COLUMNS
            ),
            &[&user_id, &pattern],
        )
    }

    fn find_by_url(&self, user_id: &str, url: &str) -> Result<Option<Bookmark>, BookmarkError> {
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE user_id = ?1 AND url = ?2 ORDER BY created_at, rowid LIMIT 1",
            BOOKMARK_COLUMNS
        );
        let bookmark = self
            .conn
            .query_row(&sql, params![user_id, url], Self::row_to_bookmark)
            .optional()?;
        Ok(bookmark)
    }
}
