use serde::{Deserialize, Serialize};

/// Represents a saved bookmark owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    /// Ordered, without empty entries or duplicates.
    pub tags: Vec<String>,
    /// `None` places the bookmark at the user's root.
    pub folder_id: Option<String>,
    pub favicon_url: Option<String>,
    pub is_favorite: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Represents a folder for organizing bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// `None` for a root folder.
    pub parent_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Partial update of a bookmark. `None` leaves a field unchanged.
///
/// `folder_id` is doubly optional: `Some(None)` moves the bookmark to root.
#[derive(Debug, Clone, Default)]
pub struct BookmarkUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<Option<String>>,
    pub favicon_url: Option<Option<String>>,
    pub is_favorite: Option<bool>,
}

/// Result of resolving a folder path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResolution {
    /// Leaf folder of the path, `None` for the empty (root) path.
    pub folder_id: Option<String>,
    /// Names of the folders that had to be created, in path order.
    pub created: Vec<String>,
}
