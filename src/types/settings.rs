use serde::{Deserialize, Serialize};

/// Per-user settings document, including the user's tag vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: String,
    pub user_id: String,
    /// The tag vocabulary: ordered, no duplicates.
    pub tag_list: Vec<String>,
    pub dark_mode: bool,
    pub accent_color: Option<String>,
    pub default_view: Option<String>,
    pub language: Option<String>,
    /// Bumped on every save.
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub tag_list: Option<Vec<String>>,
    #[serde(default)]
    pub dark_mode: Option<bool>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub default_view: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Outcome of a best-effort cascade over a user's bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Bookmarks whose tags changed and were saved.
    pub updated: usize,
    /// Bookmarks whose save failed; each failure was logged.
    pub failed: usize,
}
