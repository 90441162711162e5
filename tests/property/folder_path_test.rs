//! Property-based tests for folder path resolution.
//!
//! Resolving a fresh path creates exactly one folder per segment; resolving
//! it again creates nothing and lands on the same leaf.

use markhub::database::Database;
use markhub::managers::folder_manager::{FolderManager, FolderManagerTrait};
use markhub::services::snapshot_exporter::{SnapshotExporter, SnapshotExporterTrait};
use proptest::prelude::*;

/// Strategy for folder names: non-blank, may repeat across segments.
fn arb_segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z][A-Za-z0-9 _-]{0,12}",
        Just("Work".to_string()),
        Just("Archive".to_string()),
    ]
}

fn arb_path() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_segment(), 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn resolve_creates_once_then_reuses(path in arb_path()) {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let mut mgr = FolderManager::new(db.connection());

        let first = mgr.resolve_path("u1", &path).expect("first resolve should succeed");
        prop_assert_eq!(&first.created, &path);
        prop_assert_eq!(mgr.list_folders("u1").unwrap().len(), path.len());

        let second = mgr.resolve_path("u1", &path).expect("second resolve should succeed");
        prop_assert!(second.created.is_empty());
        prop_assert_eq!(second.folder_id, first.folder_id.clone());
        prop_assert_eq!(mgr.list_folders("u1").unwrap().len(), path.len());

        // The leaf's materialized path is the resolved path.
        let export = SnapshotExporter::new(db.connection()).export_sync("u1", None).unwrap();
        let leaf_id = first.folder_id.unwrap();
        let leaf = export.folders.iter().find(|f| f.id == leaf_id).unwrap();
        prop_assert_eq!(&leaf.path, &path);
    }

    #[test]
    fn resolve_of_prefix_creates_nothing(path in arb_path(), cut in 0usize..6) {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let mut mgr = FolderManager::new(db.connection());
        mgr.resolve_path("u1", &path).unwrap();

        let prefix = &path[..cut.min(path.len())];
        let again = mgr.resolve_path("u1", prefix).unwrap();
        prop_assert!(again.created.is_empty());
        prop_assert_eq!(again.folder_id.is_none(), prefix.is_empty());
    }
}
