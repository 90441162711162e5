use thiserror::Error;

// === BookmarkError ===

/// Errors related to bookmark management operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// Required input was missing or empty.
    #[error("Invalid bookmark input: {0}")]
    Validation(String),
    /// Bookmark with the given ID was not found.
    #[error("Bookmark not found: {0}")]
    NotFound(String),
    /// The target folder was not found.
    #[error("Bookmark folder not found: {0}")]
    FolderNotFound(String),
    /// The bookmark or folder belongs to another user.
    #[error("Bookmark access forbidden: {0}")]
    Forbidden(String),
    /// Database operation failed.
    #[error("Bookmark database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Stored tags could not be encoded or decoded.
    #[error("Bookmark serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// === FolderError ===

/// Errors related to folder management and path resolution.
#[derive(Debug, Error)]
pub enum FolderError {
    /// Required input was missing or empty.
    #[error("Invalid folder input: {0}")]
    Validation(String),
    /// Folder with the given ID was not found.
    #[error("Folder not found: {0}")]
    NotFound(String),
    /// The folder belongs to another user.
    #[error("Folder access forbidden: {0}")]
    Forbidden(String),
    /// The move would make a folder its own ancestor.
    #[error("Folder cycle: {0}")]
    Cycle(String),
    /// Database operation failed.
    #[error("Folder database error: {0}")]
    Database(#[from] rusqlite::Error),
}

// === SettingsError ===

/// Errors related to user settings and the tag vocabulary document.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The user has no settings record.
    #[error("User settings not found for user: {0}")]
    NotFound(String),
    /// Settings were already created for the user.
    #[error("User settings already exist for user: {0}")]
    AlreadyExists(String),
    /// Required input was missing or empty.
    #[error("Invalid settings input: {0}")]
    Validation(String),
    /// Database operation failed.
    #[error("Settings database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// The stored tag list could not be encoded or decoded.
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// === TagError ===

/// Errors related to tag vocabulary reconciliation.
#[derive(Debug, Error)]
pub enum TagError {
    /// No usable tags were provided.
    #[error("Invalid tag input: {0}")]
    Validation(String),
    /// The user has no settings record, so no vocabulary.
    #[error("Tag vocabulary not found for user: {0}")]
    VocabularyNotFound(String),
    /// Bookmark with the given ID was not found.
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),
    /// The bookmark belongs to another user.
    #[error("Tag access forbidden: {0}")]
    Forbidden(String),
    /// A bookmark save failed.
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    /// A settings load or save failed.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Database operation failed.
    #[error("Tag database error: {0}")]
    Database(#[from] rusqlite::Error),
}

// === BlobStoreError ===

/// Errors reported by a blob store.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// Nothing exists at the given path.
    #[error("Blob not found: {0}")]
    NotFound(String),
    /// The path escapes the store or is otherwise unusable.
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),
    /// The underlying storage failed.
    #[error("Blob store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// === SnapshotError ===

/// Errors related to snapshot export, backup and restore.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The blob store could not be reached or returned an error.
    #[error("Snapshot storage error: {0}")]
    Storage(#[from] BlobStoreError),
    /// The snapshot blob is not a valid snapshot document.
    #[error("Failed to parse snapshot {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
    /// No well-known or timestamped backup blob exists in the directory.
    #[error("No backup files found in: {0}")]
    NoBackupFound(String),
    /// Required input was missing or empty.
    #[error("Invalid snapshot input: {0}")]
    Validation(String),
    /// A bookmark read failed while building the snapshot.
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    /// A folder read failed while building the snapshot.
    #[error(transparent)]
    Folder(#[from] FolderError),
    /// Database operation failed.
    #[error("Snapshot database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// The snapshot could not be serialized.
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// === ClearError ===

/// Errors related to bulk data clearing. Any of these rolls the clear back.
#[derive(Debug, Error)]
pub enum ClearError {
    /// Listing the user's records failed.
    #[error("Failed to fetch {collection} for user {user_id}: {source}")]
    Fetch {
        collection: &'static str,
        user_id: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Deleting one record failed.
    #[error("Failed to delete {collection} record {id}: {source}")]
    Delete {
        collection: &'static str,
        id: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Emptying the tag vocabulary failed.
    #[error("Failed to clear tag list for user {0}")]
    Vocabulary(String, #[source] SettingsError),
    /// Database operation failed.
    #[error("Clear database error: {0}")]
    Database(#[from] rusqlite::Error),
}

// === ConfigError ===

/// Errors related to engine configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for `EngineConfig`.
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
