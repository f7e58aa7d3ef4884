//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.
//! The `word_index` table is the single authoritative copy of the inverted
//! index; exact lookups and ranked lookups are both answered from it.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    IndexStore, LinkGraph, LinkStore, SearchLog, StorageError, StorageResult, MIN_INDEXED_COUNT,
};
use crate::storage::SearchRecord;
use crate::TrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(TrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, TrawlError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    ///
    /// Nothing is shared with other connections; used by tests and by
    /// ephemeral command-line runs.
    pub fn open_in_memory() -> Result<Self, TrawlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Counts occurrences of each word, skipping empty strings
fn count_words<I, W>(words: I) -> HashMap<String, u32>
where
    I: IntoIterator<Item = W>,
    W: AsRef<str>,
{
    let mut counts: HashMap<String, u32> = HashMap::new();
    for word in words {
        let word = word.as_ref();
        if word.is_empty() {
            continue;
        }
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    counts
}

impl IndexStore for SqliteStorage {
    fn update_index<I, W>(&mut self, url: &str, words: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let counts = count_words(words);

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO word_index (word, url, count) VALUES (?1, ?2, ?3)
                 ON CONFLICT(word, url) DO UPDATE SET count = excluded.count",
            )?;

            for (word, count) in counts.iter().filter(|(_, c)| **c >= MIN_INDEXED_COUNT) {
                stmt.execute(params![word, url, count])?;
            }
        }
        tx.commit()?;

        tracing::trace!("Indexed {} distinct words for {}", counts.len(), url);
        Ok(())
    }

    fn highest_count_for_word(&self, word: &str) -> StorageResult<u32> {
        let highest: Option<u32> = self.conn.query_row(
            "SELECT MAX(count) FROM word_index WHERE word = ?1",
            params![word],
            |row| row.get(0),
        )?;
        Ok(highest.unwrap_or(0))
    }

    fn count_for_url(&self, word: &str, url: &str) -> StorageResult<u32> {
        let count: Option<u32> = self
            .conn
            .query_row(
                "SELECT count FROM word_index WHERE word = ?1 AND url = ?2",
                params![word, url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0))
    }

    fn ranked_urls_for_word(&self, word: &str) -> StorageResult<Vec<(String, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, count FROM word_index WHERE word = ?1 ORDER BY count DESC, url ASC",
        )?;

        let ranked = stmt
            .query_map(params![word], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ranked)
    }

    fn count_indexed_words(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT word) FROM word_index", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    fn count_index_entries(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM word_index", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl LinkStore for SqliteStorage {
    fn has_links(&self, url: &str) -> StorageResult<bool> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM crawled_pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    fn get_links(&self, url: &str) -> StorageResult<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT to_url FROM links WHERE from_url = ?1")?;

        let links = stmt
            .query_map(params![url], |row| row.get(0))?
            .collect::<Result<BTreeSet<String>, _>>()?;

        Ok(links)
    }

    fn store_links(&mut self, url: &str, links: &BTreeSet<String>) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO crawled_pages (url, crawled_at) VALUES (?1, ?2)
             ON CONFLICT(url) DO UPDATE SET crawled_at = excluded.crawled_at",
            params![url, now],
        )?;
        tx.execute("DELETE FROM links WHERE from_url = ?1", params![url])?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO links (from_url, to_url) VALUES (?1, ?2)")?;
            for link in links {
                stmt.execute(params![url, link])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn link_graph(&self) -> StorageResult<LinkGraph> {
        let mut graph = LinkGraph::new();

        let mut pages = self.conn.prepare("SELECT url FROM crawled_pages")?;
        for url in pages.query_map([], |row| row.get::<_, String>(0))? {
            graph.insert(url?, BTreeSet::new());
        }

        let mut edges = self.conn.prepare("SELECT from_url, to_url FROM links")?;
        let rows = edges.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (from, to) = row?;
            graph.entry(from).or_default().insert(to);
        }

        Ok(graph)
    }

    fn count_crawled_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM crawled_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl SearchLog for SqliteStorage {
    fn start_search(
        &mut self,
        term: &str,
        budget: u32,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO searches (term, budget, started_at, config_hash) VALUES (?1, ?2, ?3, ?4)",
            params![term, budget, now, config_hash],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_search(&mut self, search_id: i64, pages_fetched: u32) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE searches SET pages_fetched = ?1, finished_at = ?2 WHERE id = ?3",
            params![pages_fetched, now, search_id],
        )?;

        if updated == 0 {
            return Err(StorageError::SearchNotFound(search_id));
        }
        Ok(())
    }

    fn get_search(&self, search_id: i64) -> StorageResult<SearchRecord> {
        self.conn
            .query_row(
                "SELECT id, term, budget, pages_fetched, started_at, finished_at, config_hash
                 FROM searches WHERE id = ?1",
                params![search_id],
                search_from_row,
            )
            .optional()?
            .ok_or(StorageError::SearchNotFound(search_id))
    }

    fn recent_searches(&self, limit: usize) -> StorageResult<Vec<SearchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, term, budget, pages_fetched, started_at, finished_at, config_hash
             FROM searches ORDER BY id DESC LIMIT ?1",
        )?;

        let searches = stmt
            .query_map(params![limit as i64], search_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(searches)
    }
}

fn search_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchRecord> {
    Ok(SearchRecord {
        id: row.get(0)?,
        term: row.get(1)?,
        budget: row.get(2)?,
        pages_fetched: row.get(3)?,
        started_at: row.get(4)?,
        finished_at: row.get(5)?,
        config_hash: row.get(6)?,
    })
}
