//! Configuration module for Trawl-Rank
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use trawl_rank::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawl.toml")).unwrap();
//! println!("Each search may fetch up to {} pages", config.crawler.budget);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, FetcherConfig, RankSettings, StorageConfig, UserAgentConfig,
    DEFAULT_SEARCH_URL,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
