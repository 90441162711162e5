//! Property-based tests for the tag vocabulary.
//!
//! After any sequence of bookmark saves every bookmark tag is in the
//! vocabulary; deleting tags removes them everywhere and nowhere else.

use markhub::database::Database;
use markhub::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use markhub::managers::settings_manager::{SettingsManager, SettingsManagerTrait};
use markhub::managers::tag_manager::{TagManager, TagManagerTrait};
use markhub::types::bookmark::{BookmarkUpdate, NewBookmark};
use proptest::prelude::*;

fn arb_tag() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        Just("rust".to_string()),
        Just("web".to_string()),
        Just(" padded ".to_string()),
        Just(String::new()),
    ]
}

fn arb_tag_sets() -> impl Strategy<Value = Vec<Vec<String>>> {
    proptest::collection::vec(proptest::collection::vec(arb_tag(), 0..5), 1..6)
}

fn setup() -> Database {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    SettingsManager::new(db.connection()).create_settings("u1").unwrap();
    db
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn bookmark_tags_are_always_in_vocabulary(tag_sets in arb_tag_sets(), retag in proptest::collection::vec(arb_tag(), 0..4)) {
        let db = setup();
        let mut bookmarks = BookmarkManager::new(db.connection());

        let mut ids = Vec::new();
        for (i, tags) in tag_sets.iter().enumerate() {
            let bm = bookmarks
                .create_bookmark("u1", NewBookmark {
                    url: format!("https://site{}.example", i),
                    title: format!("Site {}", i),
                    tags: tags.clone(),
                    ..Default::default()
                })
                .unwrap();
            ids.push(bm.id);
        }
        bookmarks
            .update_bookmark("u1", &ids[0], BookmarkUpdate { tags: Some(retag), ..Default::default() })
            .unwrap();

        let vocabulary = SettingsManager::new(db.connection()).get_settings("u1").unwrap().tag_list;
        let mut seen = std::collections::HashSet::new();
        for tag in &vocabulary {
            prop_assert!(seen.insert(tag.clone()), "vocabulary has duplicate {:?}", tag);
        }
        for bm in bookmarks.list_all_bookmarks("u1").unwrap() {
            for tag in &bm.tags {
                prop_assert!(!tag.is_empty());
                prop_assert!(vocabulary.contains(tag), "{:?} missing from {:?}", tag, vocabulary);
            }
        }
    }

    #[test]
    fn deleting_tags_removes_them_everywhere(tag_sets in arb_tag_sets(), doomed in proptest::collection::vec("[a-z]{1,6}", 1..3)) {
        let db = setup();
        let mut bookmarks = BookmarkManager::new(db.connection());
        for (i, tags) in tag_sets.iter().enumerate() {
            bookmarks
                .create_bookmark("u1", NewBookmark {
                    url: format!("https://site{}.example", i),
                    title: format!("Site {}", i),
                    tags: tags.clone(),
                    ..Default::default()
                })
                .unwrap();
        }
        let before = bookmarks.list_all_bookmarks("u1").unwrap();

        TagManager::new(db.connection()).delete_tags("u1", &doomed).unwrap();

        let vocabulary = SettingsManager::new(db.connection()).get_settings("u1").unwrap().tag_list;
        prop_assert!(doomed.iter().all(|t| !vocabulary.contains(t)));

        let after = bookmarks.list_all_bookmarks("u1").unwrap();
        for (old, new) in before.iter().zip(after.iter()) {
            let expected: Vec<String> = old.tags.iter().filter(|t| !doomed.contains(t)).cloned().collect();
            prop_assert_eq!(&new.tags, &expected);
            if expected == old.tags {
                prop_assert_eq!(new.updated_at, old.updated_at);
            }
        }
    }
}
