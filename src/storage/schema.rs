//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Trawl-Rank database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Inverted index: one row per (word, url)
CREATE TABLE IF NOT EXISTS word_index (
    word TEXT NOT NULL,
    url TEXT NOT NULL,
    count INTEGER NOT NULL,
    PRIMARY KEY (word, url)
);

-- Serves highest-count and ranked lookups per word
CREATE INDEX IF NOT EXISTS idx_word_index_rank ON word_index(word, count DESC, url);

-- One row per crawled page, written even when the page has no links
CREATE TABLE IF NOT EXISTS crawled_pages (
    url TEXT PRIMARY KEY,
    crawled_at TEXT NOT NULL
);

-- Outbound links of crawled pages
CREATE TABLE IF NOT EXISTS links (
    from_url TEXT NOT NULL,
    to_url TEXT NOT NULL,
    PRIMARY KEY (from_url, to_url)
);

-- Search sessions
CREATE TABLE IF NOT EXISTS searches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term TEXT NOT NULL,
    budget INTEGER NOT NULL,
    pages_fetched INTEGER,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// Creates all tables and indexes if they don't already exist.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
