//! Markhub database layer.
//!
//! Provides SQLite connection management, schema migrations and the
//! transaction primitive used by all-or-nothing operations.
//!
//! # Usage
//!
//! ```no_run
//! use markhub::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("markhub.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Access the underlying connection for queries
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::{run_in_transaction, Database};
