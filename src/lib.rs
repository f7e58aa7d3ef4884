//! Trawl-Rank: a guided crawler with a hybrid relevance frontier
//!
//! This crate explores a site's link graph outward from a search term, builds an
//! inverted word index as it goes, and orders its exploration by a score computed
//! from data it has already seen. A PageRank-style pass over the discovered link
//! graph can rerank the final results.

pub mod config;
pub mod crawler;
pub mod output;
pub mod rank;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Errors that abort opening the store or running a search
///
/// Fetch failures never surface here: a session logs them and moves on.
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Search URL template has no {{term}} placeholder: {0}")]
    MissingPlaceholder(String),
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Frontier, SearchSession, SessionReport};
pub use rank::{compute_authority, hybrid_rerank, RankConfig};
pub use storage::{IndexStore, LinkStore, SqliteStorage};
