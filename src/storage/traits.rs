//! Storage traits and error types
//!
//! This module defines the trait interfaces the crawl session and the rank
//! engine depend on, and the associated error types.

use crate::storage::SearchRecord;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Search not found: {0}")]
    SearchNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Minimum number of occurrences before a word is indexed for a page
pub const MIN_INDEXED_COUNT: u32 = 3;

/// Snapshot of the discovered link graph, keyed by crawled URL
pub type LinkGraph = BTreeMap<String, BTreeSet<String>>;

/// Inverted word index: `(word, url) -> count`
pub trait IndexStore {
    /// Counts the words of a page and stores every word seen at least
    /// [`MIN_INDEXED_COUNT`] times
    ///
    /// Re-indexing a page overwrites its previous count for each stored word;
    /// counts are never summed across repeated indexing of the same URL.
    fn update_index<I, W>(&mut self, url: &str, words: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>;

    /// Returns the highest stored count for `word` across all URLs, or 0
    fn highest_count_for_word(&self, word: &str) -> StorageResult<u32>;

    /// Returns the stored count for `(word, url)`, or 0
    fn count_for_url(&self, word: &str, url: &str) -> StorageResult<u32>;

    /// Returns all `(url, count)` pairs for `word`, highest count first
    ///
    /// Equal counts are ordered by URL.
    fn ranked_urls_for_word(&self, word: &str) -> StorageResult<Vec<(String, u32)>>;

    /// Counts distinct indexed words
    fn count_indexed_words(&self) -> StorageResult<u64>;

    /// Counts `(word, url)` entries
    fn count_index_entries(&self) -> StorageResult<u64>;
}

/// Outbound links per crawled URL
///
/// The existence of a record, even one with no links, marks the URL as crawled.
pub trait LinkStore {
    /// Returns true if a link record exists for `url`
    fn has_links(&self, url: &str) -> StorageResult<bool>;

    /// Returns the stored outbound links of `url`, empty if there is no record
    fn get_links(&self, url: &str) -> StorageResult<BTreeSet<String>>;

    /// Writes the link record of `url`
    ///
    /// Callers store a URL once; a second call replaces the earlier record.
    fn store_links(&mut self, url: &str, links: &BTreeSet<String>) -> StorageResult<()>;

    /// Returns every link record
    fn link_graph(&self) -> StorageResult<LinkGraph>;

    /// Counts crawled pages (link records)
    fn count_crawled_pages(&self) -> StorageResult<u64>;

    /// Counts stored edges
    fn count_links(&self) -> StorageResult<u64>;
}

/// Audit trail of search sessions
pub trait SearchLog {
    /// Records the start of a search and returns its ID
    fn start_search(&mut self, term: &str, budget: u32, config_hash: &str)
        -> StorageResult<i64>;

    /// Marks a search as finished with the number of pages it fetched
    fn finish_search(&mut self, search_id: i64, pages_fetched: u32) -> StorageResult<()>;

    /// Gets a search by ID
    fn get_search(&self, search_id: i64) -> StorageResult<SearchRecord>;

    /// Gets the most recent searches, newest first
    fn recent_searches(&self, limit: usize) -> StorageResult<Vec<SearchRecord>>;
}
