//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - The inverted word index
//! - Link records, which double as the "already crawled" marker
//! - The search history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    IndexStore, LinkGraph, LinkStore, SearchLog, StorageError, StorageResult, MIN_INDEXED_COUNT,
};

use crate::TrawlError;

use std::path::Path;

/// Opens (creating if needed) a storage database
///
/// Failing to open the store is fatal for a search: no session can run without
/// the durable index and link records.
pub fn open_storage(path: &Path) -> Result<SqliteStorage, TrawlError> {
    SqliteStorage::new(path)
}

/// A recorded search session
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub id: i64,
    pub term: String,
    pub budget: u32,
    pub pages_fetched: Option<u32>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
}

impl SearchRecord {
    /// Returns true once the session has terminated
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}
