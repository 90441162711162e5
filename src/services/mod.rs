// Markhub services
// Services work across managers: snapshot export and restore, bulk clearing, and blob storage.

pub mod blob_store;
pub mod data_clearer;
pub mod snapshot_exporter;
pub mod snapshot_importer;
