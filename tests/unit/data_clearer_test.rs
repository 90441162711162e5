//! Unit tests for the bulk data clearer.

use markhub::database::Database;
use markhub::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use markhub::managers::folder_manager::{FolderManager, FolderManagerTrait};
use markhub::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use markhub::services::data_clearer::{DataClearer, DataClearerTrait};
use markhub::types::bookmark::NewBookmark;
use markhub::types::errors::ClearError;
use markhub::types::settings::SettingsUpdate;

fn count(db: &Database, table: &str, user_id: &str) -> i64 {
    db.connection()
        .query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", table),
            [user_id],
            |row| row.get(0),
        )
        .unwrap()
}

/// Helper: `u1` with 3 bookmarks, 2 folders and a 5-tag vocabulary, plus
/// one bookmark owned by `u2`.
fn populated() -> (Database, Vec<String>) {
    let db = Database::open_in_memory().unwrap();
    let mut settings = SettingsManager::new(db.connection());
    settings.create_settings("u1").unwrap();
    settings
        .update_settings(
            "u1",
            SettingsUpdate {
                tag_list: Some(["a", "b", "c", "d", "e"].iter().map(|t| t.to_string()).collect()),
                ..Default::default()
            },
        )
        .unwrap();

    let mut folders = FolderManager::new(db.connection());
    let parent = folders.create_folder("u1", "Parent", None).unwrap();
    let child = folders.create_folder("u1", "Child", Some(&parent.id)).unwrap();

    let mut bookmarks = BookmarkManager::new(db.connection());
    let mut ids = Vec::new();
    for (i, folder) in [None, Some(parent.id.clone()), Some(child.id.clone())].into_iter().enumerate() {
        let bm = bookmarks
            .create_bookmark(
                "u1",
                NewBookmark {
                    url: format!("https://site{}.example", i),
                    title: format!("Site {}", i),
                    tags: vec!["a".to_string()],
                    folder_id: folder,
                    ..Default::default()
                },
            )
            .unwrap();
        ids.push(bm.id);
    }
    bookmarks
        .create_bookmark(
            "u2",
            NewBookmark { url: "https://other.example".to_string(), title: "Other".to_string(), ..Default::default() },
        )
        .unwrap();

    (db, ids)
}

#[test]
fn test_clear_reports_exact_counts() {
    let (db, _) = populated();

    let report = DataClearer::new(db.connection()).clear_user_data("u1").unwrap();

    assert_eq!(report.cleared_bookmarks_count, 3);
    assert_eq!(report.cleared_folders_count, 2);
    assert!(report.tags_cleared);

    assert_eq!(count(&db, "bookmarks", "u1"), 0);
    assert_eq!(count(&db, "folders", "u1"), 0);
    assert!(SettingsManager::new(db.connection()).get_settings("u1").unwrap().tag_list.is_empty());
    assert_eq!(count(&db, "bookmarks", "u2"), 1, "other users are untouched");
}

#[test]
fn test_failed_delete_rolls_everything_back() {
    let (db, ids) = populated();
    db.connection()
        .execute_batch(&format!(
            "CREATE TRIGGER fail_second BEFORE DELETE ON bookmarks WHEN OLD.id = '{}' \
             BEGIN SELECT RAISE(ABORT, 'forced'); END;",
            ids[1]
        ))
        .unwrap();

    let err = DataClearer::new(db.connection()).clear_user_data("u1").unwrap_err();
    match err {
        ClearError::Delete { collection, id, .. } => {
            assert_eq!(collection, "bookmarks");
            assert_eq!(id, ids[1]);
        }
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(count(&db, "bookmarks", "u1"), 3);
    assert_eq!(count(&db, "folders", "u1"), 2);
    assert_eq!(SettingsManager::new(db.connection()).get_settings("u1").unwrap().tag_list.len(), 5);
    assert!(db.connection().is_autocommit());
}

#[test]
fn test_failed_vocabulary_clear_rolls_back_deletes() {
    let (db, _) = populated();
    db.connection()
        .execute_batch(
            "CREATE TRIGGER lock_settings BEFORE UPDATE ON user_settings \
             BEGIN SELECT RAISE(ABORT, 'forced'); END;",
        )
        .unwrap();

    let err = DataClearer::new(db.connection()).clear_user_data("u1").unwrap_err();
    assert!(matches!(err, ClearError::Vocabulary(..)));
    assert_eq!(count(&db, "bookmarks", "u1"), 3);
    assert_eq!(count(&db, "folders", "u1"), 2);
}

#[test]
fn test_clear_without_settings_record() {
    let db = Database::open_in_memory().unwrap();
    FolderManager::new(db.connection()).create_folder("u1", "Only", None).unwrap();

    let report = DataClearer::new(db.connection()).clear_user_data("u1").unwrap();
    assert_eq!(report.cleared_folders_count, 1);
    assert_eq!(report.cleared_bookmarks_count, 0);
    assert!(!report.tags_cleared);
}

#[test]
fn test_clear_empty_user() {
    let db = Database::open_in_memory().unwrap();
    SettingsManager::new(db.connection()).create_settings("u1").unwrap();

    let report = DataClearer::new(db.connection()).clear_user_data("u1").unwrap();
    assert_eq!(report.cleared_bookmarks_count, 0);
    assert_eq!(report.cleared_folders_count, 0);
    assert!(report.tags_cleared);
}
