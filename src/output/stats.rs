//! Statistics generation from the store
//!
//! This module provides functionality for extracting and displaying
//! store-wide statistics: how much has been crawled and indexed so far.

use crate::storage::{IndexStore, LinkStore, StorageResult};

/// Store statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Pages with a link record
    pub crawled_pages: u64,

    /// Stored link edges
    pub total_links: u64,

    /// Distinct indexed words
    pub indexed_words: u64,

    /// `(word, url)` index entries
    pub index_entries: u64,
}

impl StoreStatistics {
    /// Average out-degree of crawled pages
    pub fn links_per_page(&self) -> f64 {
        if self.crawled_pages > 0 {
            self.total_links as f64 / self.crawled_pages as f64
        } else {
            0.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The store to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S>(storage: &S) -> StorageResult<StoreStatistics>
where
    S: IndexStore + LinkStore,
{
    Ok(StoreStatistics {
        crawled_pages: storage.count_crawled_pages()?,
        total_links: storage.count_links()?,
        indexed_words: storage.count_indexed_words()?,
        index_entries: storage.count_index_entries()?,
    })
}

/// Renders statistics as a printable block
pub fn format_statistics(stats: &StoreStatistics) -> String {
    let mut out = String::from("=== Store Statistics ===\n\n");

    out.push_str(&format!("  Crawled pages: {}\n", stats.crawled_pages));
    out.push_str(&format!(
        "  Links stored: {} ({:.1} per page)\n",
        stats.total_links,
        stats.links_per_page()
    ));
    out.push_str(&format!("  Indexed words: {}\n", stats.indexed_words));
    out.push_str(&format!("  Index entries: {}\n", stats.index_entries));

    out
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &StoreStatistics) {
    print!("{}", format_statistics(stats));
}
