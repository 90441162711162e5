//! Markhub: a bookmark and folder consistency engine.
//!
//! Keeps a per-user tag vocabulary in step with bookmark tags, resolves
//! folder-name paths, exports and restores snapshots, and clears user data.
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod config;
pub mod database;
pub mod logging;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
