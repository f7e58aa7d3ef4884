//! Crawler module for guided, budgeted exploration
//!
//! This module contains the core crawling logic, including:
//! - The priority frontier and its fetch budget
//! - Hybrid relevance scoring of discovered links
//! - HTTP fetching with rate limiting and retry logic
//! - HTML parsing into links and indexable words
//! - The session loop tying them together

mod fetcher;
mod frontier;
mod parser;
mod score;
mod session;

pub use fetcher::{
    build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher, RateLimiter, RetryPolicy,
};
pub use frontier::{Frontier, FrontierEntry, Pop};
pub use parser::{index_key, normalize_words, parse_page, PageLink, ParsedPage};
pub use score::{combined_score, index_strength, url_relevance};
pub use session::{SearchSession, SessionReport, SessionState, Step, TerminationReason};

use crate::config::CrawlerConfig;
use crate::storage::{IndexStore, LinkStore, SearchLog};
use crate::TrawlError;

/// Runs a complete search and records it in the search history
///
/// This is the main entry point for a single search. It will:
/// 1. Record the search start with the config hash
/// 2. Build the search root URL for the term
/// 3. Run the session to termination
/// 4. Record the number of pages fetched
///
/// The search record is finished even when the search fails, with zero pages.
///
/// # Arguments
///
/// * `config` - The crawler section of the configuration
/// * `config_hash` - Hash of the config file the search runs under
/// * `term` - The search term as entered
///
/// # Returns
///
/// * `Ok(SessionReport)` - The search ran to termination
/// * `Err(TrawlError)` - The root URL could not be built or the store failed
pub async fn search<S, F>(
    config: &CrawlerConfig,
    config_hash: &str,
    term: &str,
    store: &mut S,
    fetcher: &mut F,
) -> Result<SessionReport, TrawlError>
where
    S: IndexStore + LinkStore + SearchLog,
    F: Fetcher,
{
    let search_id = store.start_search(term.trim(), config.budget, config_hash)?;
    tracing::debug!("Recorded search {} for '{}'", search_id, term.trim());

    let outcome = match SearchSession::from_config(config, term, store, fetcher) {
        Ok(session) => session.run().await,
        Err(e) => Err(e),
    };

    let pages_fetched = outcome.as_ref().map_or(0, |report| report.pages_fetched);
    store.finish_search(search_id, pages_fetched)?;

    if let Err(e) = &outcome {
        tracing::warn!("Search {} for '{}' failed: {}", search_id, term.trim(), e);
    }

    outcome
}
