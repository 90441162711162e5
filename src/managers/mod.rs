// Markhub state managers
// Managers own the stored records: bookmarks, folders, user settings and the tag vocabulary.

pub mod bookmark_manager;
pub mod folder_manager;
pub mod settings_manager;
pub mod tag_manager;
